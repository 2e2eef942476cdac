use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/portfolios", portfolio_routes(config))
        .nest("/blobs", blob_routes())
        .nest("/display", display_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::guest))
        .routes(routes!(handlers::auth::me))
}

fn portfolio_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new().routes(routes!(
        handlers::portfolio::get_portfolio,
        handlers::portfolio::update_portfolio,
        handlers::portfolio::delete_portfolio
    ));

    let upload = OpenApiRouter::new()
        .routes(routes!(
            handlers::portfolio::list_portfolios,
            handlers::portfolio::create_portfolio
        ))
        .nest("/{id}/images", image_routes())
        .layer(handlers::image::image_upload_body_limit(config));

    crud.merge(upload)
}

fn image_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::image::list_images,
            handlers::image::upload_images
        ))
        .routes(routes!(handlers::image::delete_image))
}

fn blob_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::blob::download_blob))
}

fn display_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::display::display_portfolio))
}
