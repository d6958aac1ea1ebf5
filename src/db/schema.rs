pub const CURRENT_SCHEMA: &str = r#"
PRAGMA foreign_keys = 1;

CREATE TABLE IF NOT EXISTS divisions (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('superuser', 'manager', 'spv', 'technician')),
    division_id INTEGER,
    FOREIGN KEY (division_id) REFERENCES divisions (id),
    CHECK (role IN ('spv', 'technician') OR division_id IS NULL)
);

CREATE TABLE IF NOT EXISTS user_sessions (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    token TEXT NOT NULL UNIQUE,
    created_at TIMESTAMP NOT NULL,
    expires_at TIMESTAMP NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS floors (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS zones (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    floor_id INTEGER,
    FOREIGN KEY (floor_id) REFERENCES floors (id)
);

CREATE TABLE IF NOT EXISTS asset_categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS assets (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    location TEXT NOT NULL DEFAULT '',
    category_id INTEGER NOT NULL,
    floor_id INTEGER,
    zone_id INTEGER,
    division_id INTEGER NOT NULL,
    FOREIGN KEY (category_id) REFERENCES asset_categories (id),
    FOREIGN KEY (floor_id) REFERENCES floors (id),
    FOREIGN KEY (zone_id) REFERENCES zones (id),
    FOREIGN KEY (division_id) REFERENCES divisions (id)
);

CREATE INDEX IF NOT EXISTS idx_assets_division ON assets (division_id);

CREATE TABLE IF NOT EXISTS checklists (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    created_by INTEGER NOT NULL,
    created_at TIMESTAMP NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (created_by) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS checklist_tasks (
    id INTEGER PRIMARY KEY,
    checklist_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    description TEXT NOT NULL,
    input_type TEXT NOT NULL CHECK (input_type IN ('visual', 'measurement', 'functional')),
    expected_unit TEXT NOT NULL DEFAULT '',
    actual_value TEXT,
    note TEXT NOT NULL DEFAULT '',
    material_used TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'pending',
    photos TEXT NOT NULL DEFAULT '[]',
    FOREIGN KEY (checklist_id) REFERENCES checklists (id) ON DELETE CASCADE
);

-- checklist_id and asset_id are plain references: submission
-- rows outlive the checklist and asset they were recorded against.
-- division_id is the asset's division at write time.
CREATE TABLE IF NOT EXISTS checklist_assignments (
    id INTEGER PRIMARY KEY,
    checklist_id INTEGER NOT NULL,
    asset_id INTEGER NOT NULL,
    division_id INTEGER,
    assigned_at TIMESTAMP NOT NULL,
    is_template BOOLEAN NOT NULL DEFAULT TRUE,
    responses TEXT,
    completed_at TIMESTAMP,
    submitted_by INTEGER,
    FOREIGN KEY (submitted_by) REFERENCES users (id),
    FOREIGN KEY (division_id) REFERENCES divisions (id),
    CHECK (is_template = 1 OR (completed_at IS NOT NULL AND submitted_by IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS idx_assignments_checklist ON checklist_assignments (checklist_id, is_template);
CREATE INDEX IF NOT EXISTS idx_assignments_asset ON checklist_assignments (asset_id);
CREATE INDEX IF NOT EXISTS idx_assignments_division ON checklist_assignments (division_id, is_template);
"#;
