use insta::assert_snapshot;
use pkgxml::app::render::ManifestRenderer;
use pkgxml::domain::model::{ApiVersion, TypeSet};

#[test]
fn renders_canonical_manifest() {
    let mut types = TypeSet::new();
    types.insert_type("CustomObject", ["Account", "Invoice__c"]);
    types.insert_type("ApexClass", ["Zeta", "Alpha"]);
    types.insert_type("ApexPage", ["*"]);

    let xml = ManifestRenderer::new()
        .unwrap()
        .render(&types, ApiVersion::new(58))
        .unwrap();
    assert_snapshot!("package_manifest", xml);
}
