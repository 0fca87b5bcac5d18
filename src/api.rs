use rocket::Route;

mod assignments;
mod laboratories;
mod rules;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(laboratories::routes());
    routes.extend(rules::routes());
    routes.extend(assignments::routes());
    routes.extend(voting::routes());
    routes
}
