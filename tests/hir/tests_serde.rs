//! Schema trees handed over by an out-of-process parser as JSON.

use crate::helpers::catalog_fixtures::*;
use crate::helpers::model_assertions::*;
use edm::hir::Model;
use edm::syntax::{CsdlNode, CsdlSchema};
use edm::{Location, Span};

#[test]
fn test_schema_survives_json() {
    let schema = catalog_schema(bare_container().with_association_set(product_categories_set(
        "ProductCategories",
    )))
    .at(Location::source("catalog.csdl", Span::from_coords(0, 0, 40, 9)));

    let json = serde_json::to_string(&schema).expect("serialize schema");
    let decoded: CsdlSchema = serde_json::from_str(&json).expect("deserialize schema");
    assert_eq!(decoded, schema);

    init_tracing();
    let model = Model::new([decoded]);
    assert_no_errors(&model);
}

#[test]
fn test_synthetic_location_survives_json() {
    let location = Location::object("EntitySet(Catalog.Store/Products)");
    let json = serde_json::to_value(&location).expect("serialize location");
    let decoded: Location = serde_json::from_value(json).expect("deserialize location");
    assert_eq!(decoded, location);
    assert!(decoded.is_synthetic());
}
