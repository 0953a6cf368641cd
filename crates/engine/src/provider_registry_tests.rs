use super::*;
use brummer_adapters::provider::MockProvider;

#[test]
fn register_then_get_round_trips() {
    let registry = ProviderRegistry::new();
    registry.register("mock", Arc::new(MockProvider::new())).unwrap();

    let provider = registry.get("mock").unwrap();
    assert_eq!(provider.name(), "mock");
}

#[test]
fn register_duplicate_name_fails() {
    let registry = ProviderRegistry::new();
    registry.register("mock", Arc::new(MockProvider::new())).unwrap();

    let err = registry
        .register("mock", Arc::new(MockProvider::new()))
        .unwrap_err();
    assert!(matches!(err, CoreError::ProviderExists(name) if name == "mock"));
}

#[test]
fn get_unknown_provider_fails() {
    let registry = ProviderRegistry::new();
    let err = registry.get("nope").unwrap_err();
    assert!(matches!(err, CoreError::UnknownProvider(name) if name == "nope"));
}

#[test]
fn names_lists_every_registered_provider() {
    let registry = ProviderRegistry::new();
    registry.register("a", Arc::new(MockProvider::new())).unwrap();
    registry.register("b", Arc::new(MockProvider::new())).unwrap();

    let mut names = registry.names();
    names.sort();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}
