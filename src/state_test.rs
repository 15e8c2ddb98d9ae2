use super::*;

#[tokio::test]
async fn app_state_starts_with_empty_registry() {
    let state = test_helpers::test_app_state();
    assert_eq!(state.registry.online_count().await, 0);
}

#[tokio::test]
async fn app_state_clones_share_registry() {
    let state = test_helpers::test_app_state();
    let clone = state.clone();

    let (tx, _rx) = tokio::sync::mpsc::channel(1);
    let user = uuid::Uuid::new_v4();
    state.registry.register(user, uuid::Uuid::new_v4(), tx).await;

    assert!(clone.registry.is_online(user).await);
}
