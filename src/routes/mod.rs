pub mod admin;
pub mod assets;
pub mod auth;
pub mod checklists;
pub mod manager;
pub mod technician;

use rocket::Route;

/// Routes mounted at `/`. Errors are answered with a plain-text body.
pub fn page_routes() -> Vec<Route> {
    routes![
        auth::index,
        auth::login_page,
        auth::login,
        auth::logout,
        admin::superuser_dashboard,
        admin::users,
        admin::new_user_page,
        admin::create_user_route,
        admin::divisions,
        admin::create_division_route,
        admin::floors,
        admin::create_floor_route,
        admin::zones,
        admin::create_zone_route,
        admin::categories,
        admin::create_category_route,
        admin::all_assets,
        assets::assets,
        assets::new_asset_page,
        assets::create_asset_route,
        assets::edit_asset_page,
        assets::update_asset_route,
        assets::delete_asset_route,
        checklists::spv_dashboard,
        checklists::checklists,
        checklists::new_checklist_page,
        checklists::create_checklist_route,
        checklists::edit_checklist_page,
        checklists::update_checklist_route,
        checklists::delete_checklist_route,
        checklists::assign_page,
        checklists::assign_route,
        checklists::sort_checklists,
        technician::technician_dashboard,
        technician::checklist_page,
        technician::submit_checklist_route,
        technician::report,
        technician::report_detail,
        manager::manager_dashboard,
    ]
}

/// Routes mounted at `/api`. Errors are answered with a JSON `ValidationResponse`.
pub fn api_routes() -> Vec<Route> {
    routes![auth::api_me, checklists::api_checklist_tasks]
}
