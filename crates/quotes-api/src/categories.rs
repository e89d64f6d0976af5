use axum::{Json, extract::State};

use quotes_db::models::CategoryRow;
use quotes_types::models::Category;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let rows = state.db_call(|db| db.list_categories()).await?;
    Ok(Json(rows.into_iter().map(CategoryRow::into_category).collect()))
}
