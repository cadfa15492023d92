use serde_json::json;

use super::*;

const BASE: &str = "https://listado.mercadolibre.com.ar/mouse";

#[test]
fn results_blob_in_arbitrary_script_yields_one_product() {
    let html = r#"<script>var tracking = 1; render({"results":[{"title":"X","permalink":"http://a/b"}]}); done();</script>"#;
    let products = extract_embedded(html, BASE);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "X");
    assert_eq!(products[0].link, "http://a/b");
    assert_eq!(products[0].id, "http://a/b");
}

#[test]
fn preloaded_state_marker_is_followed() {
    let html = r#"<script>
        window.__PRELOADED_STATE__ = {"initialState":{"meta":"{not a brace}","results":[
            {"id":"MLA1","title":"Mouse Inalámbrico","permalink":"https://articulo.mercadolibre.com.ar/MLA-1",
             "price":15999,"thumbnail":"https://http2.mlstatic.com/1.webp",
             "shipping":{"logistic_type":"fulfillment"},"seller":{"nickname":"TIENDA"},"sold_quantity":1500}
        ]}};
    </script>"#;
    let products = extract_embedded(html, BASE);
    assert_eq!(products.len(), 1);
    let p = &products[0];
    assert!((p.price - 15_999.0).abs() < f64::EPSILON);
    assert_eq!(p.img, "https://http2.mlstatic.com/1.webp");
    assert!(p.is_full);
    assert_eq!(p.seller_name.as_deref(), Some("TIENDA"));
    assert_eq!(p.sold_qty, Some(1_500));
    assert_eq!(p.sold_text.as_deref(), Some("1.500 vendidos"));
}

#[test]
fn initial_state_marker_is_second_candidate() {
    let html = r#"<script>window.__PRELOADED_STATE__ = {"broken": </script>
        <script>window.__INITIAL_STATE__ = {"page":{"items":[{"name":"Teclado","url":"https://a/t"}]}};</script>"#;
    let products = extract_embedded(html, BASE);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Teclado");
}

#[test]
fn unparsable_candidate_does_not_abort_others() {
    let html = r#"<script>window.__PRELOADED_STATE__ = {'single': 'quoted js'};
        window.__INITIAL_STATE__ = {"results":[{"title":"Ok","link":"https://a/ok"}]};</script>"#;
    let products = extract_embedded(html, BASE);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Ok");
}

#[test]
fn items_without_title_or_link_are_discarded() {
    let html = r#"{"results":[{"title":"Sin link"},{"permalink":"https://a/1"},{"title":"Ok","permalink":"https://a/2"},42]}"#;
    let products = extract_embedded(html, BASE);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Ok");
}

#[test]
fn no_state_yields_empty_not_error() {
    assert!(extract_embedded("<html><body>nada</body></html>", BASE).is_empty());
    assert!(extract_embedded(r#"{"results":[]}"#, BASE).is_empty());
}

#[test]
fn aliases_are_read_in_order() {
    let items = vec![json!({
        "name": "Alias",
        "url": "https://a/alias",
        "price_amount": "2.500",
        "image": "https://img/alias.webp",
        "store": {"name": "Tienda Oficial"},
        "sales": "40",
    })];
    let products = products_from_items(&items, BASE);
    let p = &products[0];
    assert_eq!(p.title, "Alias");
    assert!((p.price - 2_500.0).abs() < f64::EPSILON);
    assert_eq!(p.img, "https://img/alias.webp");
    assert_eq!(p.seller_name.as_deref(), Some("Tienda Oficial"));
    assert_eq!(p.sold_qty, Some(40));
    assert!(!p.is_full);
}

#[test]
fn fulfillment_anywhere_in_item_sets_full() {
    let items = vec![json!({
        "title": "Mouse",
        "permalink": "https://a/m",
        "tags": ["FULFILLMENT_READY"],
    })];
    assert!(products_from_items(&items, BASE)[0].is_full);
}

// -----------------------------------------------------------------------
// find_results_array
// -----------------------------------------------------------------------

#[test]
fn dfs_finds_nested_array() {
    let state = json!({"a": {"b": {"c": {"items": [1, 2]}}}});
    assert_eq!(find_results_array(&state).map(Vec::len), Some(2));
}

#[test]
fn dfs_prefers_results_over_items_on_same_object() {
    let state = json!({"items": [1], "results": [1, 2, 3]});
    assert_eq!(find_results_array(&state).map(Vec::len), Some(3));
}

#[test]
fn dfs_skips_empty_arrays() {
    let state = json!({"results": [], "nested": {"results": [{"title": "x"}]}});
    assert_eq!(find_results_array(&state).map(Vec::len), Some(1));
}

#[test]
fn dfs_descends_into_arrays() {
    let state = json!([{"x": 1}, {"y": {"results": ["a"]}}]);
    assert_eq!(find_results_array(&state).map(Vec::len), Some(1));
}

#[test]
fn dfs_follows_source_key_order() {
    let html = r#"<script>window.__PRELOADED_STATE__ = {"pageState":{"initialState":{"results":[
        {"title":"Mouse","permalink":"https://a/m"}]}},"melidata":{"items":[{"event":"view"}]}};</script>"#;
    let products = extract_embedded(html, BASE);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Mouse");
}

#[test]
fn dfs_without_match_is_none() {
    let state = json!({"results": "not an array", "items": {"k": 1}});
    assert!(find_results_array(&state).is_none());
}
