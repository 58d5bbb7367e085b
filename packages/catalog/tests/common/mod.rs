//! Store contract shared by every backend's integration tests.
//!
//! Each function takes a freshly created, empty store.

#![allow(dead_code)]

use catalog::testing::offering_spec;
use catalog::{ingest, CatalogStore, Modality, OfferingFilter, OfferingSpec};

fn p1_specs() -> Vec<OfferingSpec> {
    vec![
        offering_spec("P1", "M1", "p1/m1", 0.5, 1.5),
        offering_spec("P1", "M2", "p1/m2", 1.0, 3.0)
            .with_context_window(4000)
            .with_modalities([Modality::Text, Modality::Image]),
    ]
}

/// Filtering by modality and the default average-cost ordering.
pub async fn find_by_modality_and_cost(store: &dyn CatalogStore) {
    let report = ingest(store, "contract", &p1_specs()).await;
    assert_eq!(report.processed, 2);

    let with_image = store
        .find_offerings(&OfferingFilter::new().with_required_modalities([Modality::Image]))
        .await
        .unwrap();
    let names: Vec<_> = with_image.iter().map(|v| v.offering.api_model_name.as_str()).collect();
    assert_eq!(names, vec!["p1/m2"]);

    let all = store.find_offerings(&OfferingFilter::new()).await.unwrap();
    let names: Vec<_> = all.iter().map(|v| v.offering.api_model_name.as_str()).collect();
    assert_eq!(names, vec!["p1/m1", "p1/m2"]);

    let wide = store
        .find_offerings(&OfferingFilter::new().with_min_context_window(5000))
        .await
        .unwrap();
    assert_eq!(wide.len(), 1);
    assert_eq!(wide[0].offering.api_model_name, "p1/m1");
}

/// Ingesting the same batch twice leaves the store unchanged.
pub async fn ingest_is_idempotent(store: &dyn CatalogStore) {
    ingest(store, "contract", &p1_specs()).await;
    let counts = store.counts().await.unwrap();
    let before = store.find_offerings(&OfferingFilter::new()).await.unwrap();

    let again = ingest(store, "contract", &p1_specs()).await;
    assert_eq!(again.updated, 2);
    assert_eq!(store.counts().await.unwrap(), counts);
    assert_eq!(store.find_offerings(&OfferingFilter::new()).await.unwrap(), before);
}

/// Re-ingesting a pair overwrites it in place.
pub async fn reingest_overwrites_in_place(store: &dyn CatalogStore) {
    ingest(store, "contract", &[offering_spec("P1", "M1", "p1/m1", 0.5, 1.5)]).await;
    let original = store.find_offerings(&OfferingFilter::new()).await.unwrap();

    let updated = offering_spec("P1", "M1", "p1/m1", 1.5, 1.5).with_context_window(16000);
    ingest(store, "contract", &[updated]).await;

    let offerings = store.find_offerings(&OfferingFilter::new()).await.unwrap();
    assert_eq!(store.counts().await.unwrap().offerings, 1);
    assert_eq!(offerings[0].offering.id, original[0].offering.id);
    assert_eq!(offerings[0].offering.context_window, 16000);
    assert_eq!(offerings[0].offering.input_cost_per_mtok, 1.5);
}

/// The modality set is cleared and rebuilt on update.
pub async fn modalities_are_replaced(store: &dyn CatalogStore) {
    let spec = offering_spec("P1", "M1", "p1/m1", 1.0, 1.0).with_modalities([Modality::Text, Modality::Audio]);
    ingest(store, "contract", &[spec.clone()]).await;
    ingest(store, "contract", &[spec.with_modalities([Modality::Image])]).await;

    let offerings = store.find_offerings(&OfferingFilter::new()).await.unwrap();
    let modalities: Vec<_> = offerings[0].offering.modalities.iter().collect();
    assert_eq!(modalities, vec![Modality::Image]);
}

/// Providers and models converge on one row per name.
pub async fn providers_and_models_converge(store: &dyn CatalogStore) {
    let specs = vec![
        offering_spec("Acme", "Shared", "acme/shared", 1.0, 1.0),
        offering_spec("Globex", "Shared", "globex/shared", 2.0, 2.0),
        offering_spec("Acme", "Other", "acme/other", 3.0, 3.0)
            .with_api_key_name("IGNORED_AFTER_CREATE"),
    ];
    ingest(store, "contract", &specs).await;

    let counts = store.counts().await.unwrap();
    assert_eq!(counts.providers, 2);
    assert_eq!(counts.models, 2);
    assert_eq!(counts.offerings, 3);

    let acme = store.find_provider_by_name("Acme").await.unwrap().unwrap();
    assert_eq!(acme.api_key_name, None);
    assert_eq!(store.get_provider(acme.id).await.unwrap(), Some(acme));
    assert!(store.find_model_by_name("Shared").await.unwrap().is_some());
}

/// An api name collision aborts only the offending spec.
pub async fn conflicting_api_name_is_isolated(store: &dyn CatalogStore) {
    let specs = vec![
        offering_spec("P1", "M1", "dup", 1.0, 1.0),
        offering_spec("P2", "M2", "dup", 2.0, 2.0),
        offering_spec("P1", "M3", "p1/m3", 3.0, 3.0),
    ];
    let report = ingest(store, "contract", &specs).await;

    assert_eq!(report.processed, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);

    let counts = store.counts().await.unwrap();
    assert_eq!(counts.offerings, 2);
    assert_eq!(counts.providers, 1);
    assert!(store.find_model_by_name("M2").await.unwrap().is_none());
}

/// Lookup by api name only sees active offerings, cheapest combined cost first.
pub async fn api_name_lookup(store: &dyn CatalogStore) {
    let specs = vec![
        offering_spec("P1", "M1", "dear", 5.0, 5.0),
        offering_spec("P1", "M2", "cheap", 1.0, 1.0),
        offering_spec("P1", "M3", "retired", 0.1, 0.1).with_active(false),
    ];
    ingest(store, "contract", &specs).await;

    let requested = vec!["dear".to_string(), "cheap".to_string(), "retired".to_string()];
    let found = store.find_offerings_by_api_names(&requested).await.unwrap();
    let names: Vec<_> = found.iter().map(|v| v.offering.api_model_name.as_str()).collect();
    assert_eq!(names, vec!["cheap", "dear"]);

    let active = store.list_active_api_names().await.unwrap();
    assert_eq!(active, vec!["dear".to_string(), "cheap".to_string()]);

    let inactive = store.find_offerings(&OfferingFilter::new().inactive()).await.unwrap();
    assert_eq!(inactive.len(), 1);
    assert!(store.find_offerings_by_api_names(&[]).await.unwrap().is_empty());
}

/// Paging over providers.
pub async fn providers_page(store: &dyn CatalogStore) {
    let specs: Vec<_> = (0..5)
        .map(|i| offering_spec(&format!("P{i}"), "M", &format!("p{i}/m"), 1.0, 1.0))
        .collect();
    ingest(store, "contract", &specs).await;

    let page = store.list_providers(1, 2).await.unwrap();
    let names: Vec<_> = page.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["P1", "P2"]);
    assert_eq!(store.list_models(0, 100).await.unwrap().len(), 1);
}

/// Offering lookup by id carries provider and model names.
pub async fn offering_by_id(store: &dyn CatalogStore) {
    ingest(store, "contract", &p1_specs()).await;
    let offerings = store.find_offerings(&OfferingFilter::new()).await.unwrap();
    let first = &offerings[0];

    let view = store.get_offering(first.offering.id).await.unwrap().unwrap();
    assert_eq!(view.provider_name, "P1");
    assert_eq!(view.model_name, "M1");
    assert!(store.get_offering(catalog::OfferingId::new(999)).await.unwrap().is_none());
}
