use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

const UI_PATH: &str = "/docs";
const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Interactive documentation for the dashboard API.
pub fn router(state: SharedState) -> Router<SharedState> {
    let ui = SwaggerUi::new(UI_PATH).url(OPENAPI_PATH, ApiDoc::openapi());
    Router::from(ui).with_state(state)
}
