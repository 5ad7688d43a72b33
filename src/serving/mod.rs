mod context;
mod rejection;
mod routes;
mod schema;

pub use context::{AppContext, ModelState};
pub use rejection::handle_rejection;
pub use routes::routes;
pub use schema::{ApiError, ApiSchemas, HealthResponse, IrisInput, PredictionResponse};
