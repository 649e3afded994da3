pub use mediator::DefaultAsyncMediator;

use crate::features::FeatureState;

pub mod middleware;

pub type AppMediator = DefaultAsyncMediator;

pub fn build_mediator(state: FeatureState) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Search
        .add_handler({
            let state = state.clone();
            move |cmd| {
                let state = state.clone();
                async move { crate::features::search::commands::dispatch::handle(state, cmd).await }
            }
        })
        // Sessions
        .add_handler({
            let state = state.clone();
            move |cmd| {
                let state = state.clone();
                async move { crate::features::sessions::commands::create::handle(state, cmd).await }
            }
        })
        .add_handler({
            let state = state.clone();
            move |query| {
                let state = state.clone();
                async move { crate::features::sessions::queries::get_status::handle(state, query).await }
            }
        })
        // Results
        .add_handler({
            let state = state.clone();
            move |query| {
                let state = state.clone();
                async move { crate::features::results::queries::get_page::handle(state, query).await }
            }
        })
        .add_handler({
            let state = state.clone();
            move |query| {
                let state = state.clone();
                async move { crate::features::results::queries::download::handle(state, query).await }
            }
        })
        // Catalog
        .add_handler({
            let state = state.clone();
            move |query| {
                let state = state.clone();
                async move { crate::features::catalog::queries::list_genomes::handle(state, query).await }
            }
        })
        .add_handler({
            let state = state.clone();
            move |query| {
                let state = state.clone();
                async move { crate::features::catalog::queries::list_assemblies::handle(state, query).await }
            }
        })
        .add_handler({
            let state = state.clone();
            move |query| {
                let state = state.clone();
                async move { crate::features::catalog::queries::list_regulators::handle(state, query).await }
            }
        })
        .add_handler({
            let state = state.clone();
            move |query| {
                let state = state.clone();
                async move { crate::features::catalog::queries::list_genes::handle(state, query).await }
            }
        })
        .add_handler({
            let state = state.clone();
            move |query| {
                let state = state.clone();
                async move { crate::features::catalog::queries::list_tissues::handle(state, query).await }
            }
        })
        .add_handler({
            let state = state.clone();
            move |query| {
                let state = state.clone();
                async move { crate::features::catalog::queries::download_regulator::handle(state, query).await }
            }
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::test_state;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mediator_builds() {
        let t = test_state();
        let _mediator = build_mediator(t.state.clone());
    }
}
