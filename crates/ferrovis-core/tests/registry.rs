//! Tests for classification and registration

mod common;

use common::Fixture;
use ferrovis_core::classify::{classify, ClassificationCache, Encoding};
use ferrovis_core::registry::{SummaryFormatter, TypeNameSpecifier};
use ferrovis_core::summary::SummaryKind;
use ferrovis_core::types::{CompileUnit, Field, Language, TypeDescriptor, TypeTable};

#[test]
fn test_registered_encodings()
{
    let mut fixture = Fixture::new();
    fixture.option_i32();
    fixture.option_ref();
    fixture.singleton();
    fixture.pair();
    let i32 = fixture.i32();
    fixture.vec(i32);
    fixture.register();

    let registry = &fixture.registry;
    assert_eq!(
        registry.encoding_of("core::option::Option<i32>"),
        Some(&Encoding::RegularEnum)
    );
    assert_eq!(
        registry.encoding_of("core::option::Some"),
        Some(&Encoding::EnumVariantBody)
    );
    assert_eq!(registry.encoding_of("demo::Wrapper"), Some(&Encoding::Singleton));
    assert_eq!(registry.encoding_of("demo::Pair"), Some(&Encoding::TupleLike));
    assert_eq!(registry.encoding_of("alloc::vec::Vec<i32>"), Some(&Encoding::Opaque));
    assert_eq!(registry.encoding_of("i32"), None);

    match registry.encoding_of("core::option::Option<&i32>") {
        Some(Encoding::NicheOptimized(layout)) => {
            assert_eq!(layout.field_path.as_slice(), &[0]);
            assert_eq!(layout.null_variant, "None");
        }
        other => panic!("unexpected encoding {other:?}"),
    }
}

#[test]
fn test_registration_report()
{
    let mut fixture = Fixture::new();
    fixture.option_i32();
    fixture.pair();

    let report = fixture.register();
    assert_eq!(report.units_scanned, 1);
    assert_eq!(report.units_skipped, 0);
    assert_eq!(report.types_scanned, 4);
    assert_eq!(report.duplicates, 0);
    assert_eq!(report.by_encoding.get("enum-variant"), Some(&2));
    assert_eq!(report.by_encoding.get("regular-enum"), Some(&1));
    assert_eq!(report.by_encoding.get("tuple"), Some(&1));
    assert_eq!(report.registered(), 4);
}

#[test]
fn test_registration_is_idempotent()
{
    let mut fixture = Fixture::new();
    fixture.option_i32();
    fixture.register();
    let summaries = fixture.registry.category().summaries().len();
    let synthetics = fixture.registry.category().synthetics().len();

    let report = fixture.register();
    assert_eq!(report.duplicates, report.types_scanned);
    assert_eq!(report.registered(), 0);
    assert_eq!(fixture.registry.category().summaries().len(), summaries);
    assert_eq!(fixture.registry.category().synthetics().len(), synthetics);
}

#[test]
fn test_foreign_units_are_skipped()
{
    let mut types = TypeTable::new();
    let u8 = types.byte_type();
    let pair = types.insert(TypeDescriptor::structure(
        "c_pair",
        2,
        vec![Field::named("__0", u8, 0), Field::named("__1", u8, 1)],
    ));
    let units = [CompileUnit::new("pair.c", Language::Other, vec![pair])];

    let mut fixture = Fixture::new();
    let report = fixture.registry.classify_and_register_all(&types, &units);
    assert_eq!(report.units_skipped, 1);
    assert_eq!(report.units_scanned, 0);
    assert_eq!(report.types_scanned, 0);
    assert!(fixture.registry.encoding_of("c_pair").is_none());
}

#[test]
fn test_builtin_bindings_present_before_registration()
{
    let fixture = Fixture::new();
    let category = fixture.registry.category();

    assert_eq!(category.name(), "Rust");
    assert!(category.is_enabled());
    assert!(category.synthetic_for("alloc::string::String").is_some());
    assert!(category.synthetic_for("std::ffi::c_str::CString").is_some());
    assert!(category.synthetic_for("alloc::vec::Vec<alloc::string::String>").is_some());
    assert_eq!(
        category.summary_for("i32[3]"),
        Some(&SummaryFormatter::Function(SummaryKind::Array))
    );
}

#[test]
fn test_disabled_category()
{
    let mut fixture = Fixture::new();
    let pair = fixture.pair();
    fixture.register();
    fixture.write_i32s(0x1000, &[1, 2]);
    fixture.registry.category_mut().set_enabled(false);

    let value = fixture.value(pair, 0x1000);
    let ctx = fixture.ctx();
    assert!(fixture.registry.summary(&value, &ctx).is_none());
    assert!(fixture.registry.synthetic(&value, &ctx).is_none());
}

#[test]
fn test_custom_binding()
{
    let mut fixture = Fixture::new();
    let pair = fixture.pair();
    fixture.write_i32s(0x1000, &[3, 4]);
    fixture
        .registry
        .attach_summary(TypeNameSpecifier::pattern(r"^demo::\w+$").unwrap(), SummaryKind::Tuple);

    let value = fixture.value(pair, 0x1000);
    assert_eq!(fixture.summary(&value).as_deref(), Some("(3, 4)"));
}

#[test]
fn test_classify_shapes()
{
    let mut types = TypeTable::new();
    let u8 = types.byte_type();

    let empty = TypeDescriptor::structure("Empty", 0, Vec::new());
    assert_eq!(classify(&empty), Encoding::Opaque);

    let named_union = TypeDescriptor::union("Bits", 1, vec![Field::named("raw", u8, 0)]);
    assert_eq!(classify(&named_union), Encoding::Opaque);

    let malformed = TypeDescriptor::union("Broken", 1, vec![Field::named("RUST$ENCODED$ENUM$None", u8, 0)]);
    assert_eq!(classify(&malformed), Encoding::Opaque);

    let plain = TypeDescriptor::structure("Point", 2, vec![Field::named("x", u8, 0), Field::named("y", u8, 1)]);
    assert_eq!(classify(&plain), Encoding::Opaque);

    let array = types.insert(TypeDescriptor::array("u8[2]", u8, 2, 2));
    assert_eq!(classify(types.get(array).unwrap()), Encoding::Opaque);
}

#[test]
fn test_classification_is_memoized_by_name()
{
    let u8 = TypeTable::new().byte_type();
    let mut cache = ClassificationCache::new();

    let first = TypeDescriptor::union(
        "Reused",
        1,
        vec![Field::named("A", u8, 0), Field::named("B", u8, 0)],
    );
    let second = TypeDescriptor::structure("Reused", 1, vec![Field::named("__0", u8, 0)]);

    assert_eq!(cache.classify(&first), Encoding::RegularEnum);
    assert_eq!(cache.classify(&second), Encoding::RegularEnum);
    assert_eq!(cache.len(), 1);
}
