//! End-to-end tests for building and rendering queries.
//!
//! These tests exercise the public API only: options are composed, applied
//! to a fresh filter set, rendered and attached to requests.

use apicalypse_core::options::{exclude, fields, limit, offset, search, sort, where_clause};
use apicalypse_core::{
    apply_all, compose, new_request, new_url_request, Error, FilterName, FilterOption, FilterSet,
    OverlapPolicy,
};
use pretty_assertions::assert_eq;

/// Split rendered output into a sorted list of clauses.
fn clauses(rendered: &str) -> Vec<String> {
    let mut clauses: Vec<String> = rendered
        .split_inclusive("; ")
        .map(String::from)
        .collect();
    clauses.sort();
    clauses
}

#[test]
fn test_limit_and_offset_render_both_clauses() {
    let filters = FilterSet::from_options([limit(5), offset(10)]).unwrap();
    let rendered = filters.render();

    assert!(rendered.contains("limit 5; "));
    assert!(rendered.contains("offset 10; "));
    assert_eq!(clauses(&rendered), vec!["limit 5; ", "offset 10; "]);
}

#[test]
fn test_full_query_contains_every_clause() {
    let filters = FilterSet::from_options([
        fields(["name", "release date", "rating"]),
        exclude(["summary"]),
        where_clause(["rating > 50", "genres = (RPG, Adventure)"]),
        sort("rating", "desc"),
        search("name", "halo"),
        limit(25),
        offset(50),
    ])
    .unwrap();

    assert_eq!(filters.len(), FilterName::ALL.len());
    assert_eq!(
        clauses(&filters.render()),
        vec![
            "exclude summary; ",
            "fields name,releasedate,rating; ",
            "limit 25; ",
            "offset 50; ",
            "search name \"halo\"; ",
            "sort rating desc; ",
            "where rating > 50 & genres = (RPG, Adventure); ",
        ]
    );
}

#[test]
fn test_render_twice_yields_same_clauses() {
    let filters =
        FilterSet::from_options([fields(["id"]), limit(1), sort("id", "asc")]).unwrap();
    assert_eq!(clauses(&filters.render()), clauses(&filters.render()));
}

#[test]
fn test_composed_option_reused_across_requests() {
    let popular = compose([fields(["name", "popularity"]), sort("popularity", "desc")]);

    let first = new_request(
        "POST",
        "https://games.example.com/games/",
        [popular.clone(), limit(10)],
    )
    .unwrap();
    let second = new_request(
        "POST",
        "https://games.example.com/games/",
        [popular, limit(10), offset(10)],
    )
    .unwrap();

    let body = |request: &reqwest::Request| {
        String::from_utf8(request.body().unwrap().as_bytes().unwrap().to_vec()).unwrap()
    };

    assert_eq!(
        clauses(&body(&first)),
        vec![
            "fields name,popularity; ",
            "limit 10; ",
            "sort popularity desc; ",
        ]
    );
    assert!(body(&second).contains("offset 10; "));
}

#[test]
fn test_composition_law_holds_for_failures() {
    let members = vec![limit(10), fields(Vec::<String>::new()), offset(3)];

    let mut direct = FilterSet::new();
    let direct_err = apply_all(&mut direct, members.clone()).unwrap_err();

    let mut composed = FilterSet::new();
    let composed_err = apply_all(&mut composed, [compose(members)]).unwrap_err();

    assert_eq!(direct_err, Error::MissingInput(FilterName::Fields));
    assert_eq!(composed_err, direct_err);
    assert_eq!(composed, direct);
    assert_eq!(direct.get(FilterName::Limit), Some("10"));
    assert!(!direct.contains(FilterName::Offset));
}

#[test]
fn test_reject_policy_reports_overlap() {
    let mut filters = FilterSet::with_policy(OverlapPolicy::Reject);
    let err = apply_all(&mut filters, [limit(10), limit(20)]).unwrap_err();

    assert_eq!(err, Error::FilterOverlap(FilterName::Limit));
    assert_eq!(filters.get(FilterName::Limit), Some("10"));
}

#[test]
fn test_absent_option_aborts_request() {
    let options: Vec<Option<FilterOption>> = vec![Some(limit(1)), None];
    let err = new_request("GET", "https://games.example.com/", options).unwrap_err();
    assert_eq!(err, Error::NilOption);
    assert!(err.is_validation());
}

#[test]
fn test_url_request_escapes_search() {
    let request = new_url_request(
        "GET",
        "https://games.example.com/search/",
        [search("", "Halo")],
    )
    .unwrap();

    assert_eq!(
        request.url().as_str(),
        "https://games.example.com/search/search%20%22Halo%22%3B%20"
    );
}
