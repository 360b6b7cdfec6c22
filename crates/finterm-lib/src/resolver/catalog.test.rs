use super::*;

fn country(iso2: &str, iso3: &str, name: &str) -> Country {
    Country {
        iso2: iso2.to_string(),
        iso3: iso3.to_string(),
        name: name.to_string(),
    }
}

#[test]
fn test_builtin_pools_are_populated() {
    let catalog = Catalog::builtin();
    assert!(catalog.countries().len() > 40);
    assert!(!catalog.datasets().is_empty());
    assert!(!catalog.categories().is_empty());
}

#[test]
fn test_country_prefix_resolves() {
    let catalog = Catalog::builtin();
    let matches = catalog.resolve_local("franc");

    assert_eq!(matches.len(), 1);
    let france = &matches[0];
    assert_eq!(france.kind, MatchKind::Country);
    assert_eq!(france.label, "France");
    assert_eq!(france.score, 95.0);
    assert_eq!(france.iso3.as_deref(), Some("FRA"));
    assert_eq!(france.href, "/explorer/country/fra");
}

#[test]
fn test_resolve_local_is_idempotent() {
    let catalog = Catalog::builtin();
    assert_eq!(catalog.resolve_local("franc"), catalog.resolve_local("franc"));
    assert_eq!(catalog.resolve_local("rates"), catalog.resolve_local("rates"));
}

#[test]
fn test_iso_codes_score_exact() {
    let catalog = Catalog::builtin();

    let by_iso2 = catalog.resolve_local("us");
    assert_eq!(by_iso2[0].label, "United States of America");
    assert_eq!(by_iso2[0].score, 100.0);

    let by_iso3 = catalog.resolve_local("DEU");
    assert_eq!(by_iso3[0].label, "Germany");
    assert_eq!(by_iso3[0].score, 100.0);
}

#[test]
fn test_ties_keep_pool_order() {
    let catalog = Catalog::builtin();
    let matches = catalog.resolve_local("us");

    let labels: Vec<&str> = matches.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(labels, vec!["United States of America", "Australia", "Austria"]);
}

#[test]
fn test_datasets_score_best_of_id_and_labels() {
    let catalog = Catalog::builtin();
    let matches = catalog.resolve_local("gdp");

    assert_eq!(matches[0].kind, MatchKind::Dataset);
    assert_eq!(matches[0].label, "Gross Domestic Product");
    assert_eq!(matches[0].score, 100.0);
    assert_eq!(matches[0].href, "/explorer/dataset/gdp");

    let debt = matches.iter().find(|m| m.label == "Government Debt to GDP").unwrap();
    assert_eq!(debt.score, 80.0);
}

#[test]
fn test_categories_are_scored() {
    let catalog = Catalog::builtin();
    let matches = catalog.resolve_local("fiscal");

    assert_eq!(matches[0].kind, MatchKind::Category);
    assert_eq!(matches[0].href, "/explorer/category/fiscal");
}

#[test]
fn test_results_are_capped_and_sorted() {
    let catalog = Catalog::builtin();
    let matches = catalog.resolve_local("a");

    assert_eq!(matches.len(), LOCAL_RESULT_LIMIT);
    assert!(matches.windows(2).all(|pair| pair[0].score >= pair[1].score));
    assert!(matches.iter().all(|m| m.score >= LOCAL_MATCH_THRESHOLD));
}

#[test]
fn test_blank_query_matches_nothing() {
    assert!(Catalog::builtin().resolve_local("   ").is_empty());
}

#[test]
fn test_custom_catalog() {
    let catalog = Catalog::new(
        vec![country("NO", "NOR", "Norway"), country("NZ", "NZL", "New Zealand")],
        Vec::new(),
        Vec::new(),
    );

    let matches = catalog.resolve_local("n");
    let labels: Vec<&str> = matches.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(labels, vec!["Norway", "New Zealand"]);
    assert!(catalog.resolve_local("xyz123").is_empty());
}
