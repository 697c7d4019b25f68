use crate::models::{Datapoint, RECIPE_START, RecipeStart};

pub fn is_recipe_start(datapoint: &Datapoint) -> bool {
    datapoint.variable == RECIPE_START && datapoint.id.is_some()
}

/// Latest recipe start within this batch only. Earlier batches are not consulted.
pub fn find_recipe_start(data: &[Datapoint]) -> Option<RecipeStart> {
    data.iter()
        .filter(|datapoint| is_recipe_start(datapoint))
        .fold(None::<&Datapoint>, |latest, candidate| match latest {
            Some(current) if current.timestamp >= candidate.timestamp => Some(current),
            _ => Some(candidate),
        })
        .and_then(|datapoint| {
            datapoint.id.clone().map(|id| RecipeStart {
                id,
                timestamp: datapoint.timestamp,
            })
        })
}
