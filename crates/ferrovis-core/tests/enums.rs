//! Tests for enum and tuple formatting

mod common;

use common::Fixture;
use ferrovis_core::config::FormatterConfig;
use ferrovis_core::error::FormatError;
use ferrovis_core::types::Address;

fn write_option_i32(fixture: &mut Fixture, at: u64, discriminant: u32, payload: i32)
{
    fixture.memory.write_bytes(Address::from(at), &[0; 8]);
    fixture.memory.write_u32(Address::from(at), discriminant);
    fixture.memory.write_bytes(Address::from(at + 4), &payload.to_le_bytes());
}

#[test]
fn test_regular_enum_some()
{
    let mut fixture = Fixture::new();
    let option = fixture.option_i32();
    fixture.register();
    write_option_i32(&mut fixture, 0x1000, 1, 42);

    let value = fixture.value(option, 0x1000);
    assert_eq!(fixture.summary(&value).as_deref(), Some("Some(42)"));
}

#[test]
fn test_regular_enum_none()
{
    let mut fixture = Fixture::new();
    let option = fixture.option_i32();
    fixture.register();
    write_option_i32(&mut fixture, 0x1000, 0, 0);

    let value = fixture.value(option, 0x1000);
    assert_eq!(fixture.summary(&value).as_deref(), Some("None"));

    let ctx = fixture.ctx();
    let mut synthetic = fixture.registry.synthetic(&value, &ctx).unwrap();
    assert!(synthetic.update(&ctx));
    assert_eq!(synthetic.child_count(&ctx), 0);
    assert!(!synthetic.has_children(&ctx));
}

#[test]
fn test_regular_enum_hides_discriminant()
{
    let mut fixture = Fixture::new();
    let option = fixture.option_i32();
    fixture.register();
    write_option_i32(&mut fixture, 0x1000, 1, 42);

    let value = fixture.value(option, 0x1000);
    let ctx = fixture.ctx();
    let mut synthetic = fixture.registry.synthetic(&value, &ctx).unwrap();
    assert!(synthetic.update(&ctx));

    assert_eq!(synthetic.child_count(&ctx), 1);
    let payload = synthetic.child_at(&ctx, 0).unwrap();
    assert_eq!(payload.name(), Some("__0"));
    assert_eq!(payload.address(), Address::from(0x1004));
    assert_eq!(ctx.object_summary(&payload), "42");

    assert_eq!(synthetic.child_index(&ctx, "__0").unwrap(), 0);
    assert!(matches!(
        synthetic.child_index(&ctx, "RUST$ENUM$DISR"),
        Err(FormatError::NotFound(_))
    ));
    assert!(matches!(
        synthetic.child_at(&ctx, 1),
        Err(FormatError::OutOfRange { index: 1, count: 1 })
    ));
}

#[test]
fn test_regular_enum_struct_variant()
{
    let mut fixture = Fixture::new();
    let shape = fixture.shape();
    fixture.register();
    fixture.memory.write_bytes(Address::from(0x1000), &[0; 12]);
    fixture.memory.write_u32(Address::from(0x1000), 1);
    fixture.memory.write_u32(Address::from(0x1004), 3);
    fixture.memory.write_u32(Address::from(0x1008), 4);

    let value = fixture.value(shape, 0x1000);
    assert_eq!(fixture.summary(&value).as_deref(), Some("Rect{w:3, h:4}"));

    let ctx = fixture.ctx();
    let mut synthetic = fixture.registry.synthetic(&value, &ctx).unwrap();
    synthetic.update(&ctx);
    assert_eq!(synthetic.child_count(&ctx), 2);
    assert_eq!(synthetic.child_index(&ctx, "h").unwrap(), 1);
    assert_eq!(synthetic.child_at(&ctx, 0).unwrap().name(), Some("w"));
}

#[test]
fn test_regular_enum_invalid_discriminant()
{
    let mut fixture = Fixture::new();
    let option = fixture.option_i32();
    fixture.register();
    write_option_i32(&mut fixture, 0x1000, 7, 0);

    let value = fixture.value(option, 0x1000);
    assert!(fixture.summary(&value).is_none());

    let ctx = fixture.ctx();
    let mut synthetic = fixture.registry.synthetic(&value, &ctx).unwrap();
    assert!(!synthetic.update(&ctx));
    assert!(synthetic.is_broken());
    assert_eq!(synthetic.child_count(&ctx), 0);
    assert!(matches!(
        synthetic.child_at(&ctx, 0),
        Err(FormatError::OutOfRange { index: 0, count: 0 })
    ));
    assert!(matches!(
        synthetic.child_index(&ctx, "__0"),
        Err(FormatError::NotFound(_))
    ));
}

#[test]
fn test_broken_provider_stays_broken()
{
    let mut fixture = Fixture::new();
    let option = fixture.option_i32();
    fixture.register();
    write_option_i32(&mut fixture, 0x1000, 7, 0);

    let value = fixture.value(option, 0x1000);
    let mut synthetic = {
        let ctx = fixture.ctx();
        let mut synthetic = fixture.registry.synthetic(&value, &ctx).unwrap();
        assert!(!synthetic.update(&ctx));
        synthetic
    };

    write_option_i32(&mut fixture, 0x1000, 1, 5);
    let ctx = fixture.ctx();
    assert!(!synthetic.update(&ctx));
    assert!(synthetic.summary(&ctx).is_none());
}

#[test]
fn test_update_refreshes_ready_provider()
{
    let mut fixture = Fixture::new();
    let option = fixture.option_i32();
    fixture.register();
    write_option_i32(&mut fixture, 0x1000, 0, 0);

    let value = fixture.value(option, 0x1000);
    let mut synthetic = {
        let ctx = fixture.ctx();
        let mut synthetic = fixture.registry.synthetic(&value, &ctx).unwrap();
        assert!(synthetic.update(&ctx));
        assert_eq!(synthetic.child_count(&ctx), 0);
        synthetic
    };

    write_option_i32(&mut fixture, 0x1000, 1, 9);
    let ctx = fixture.ctx();
    assert!(synthetic.update(&ctx));
    assert_eq!(synthetic.child_count(&ctx), 1);
    assert_eq!(synthetic.summary(&ctx).as_deref(), Some("Some(9)"));
}

#[test]
fn test_methods_before_update_initialize_lazily()
{
    let mut fixture = Fixture::new();
    let option = fixture.option_i32();
    fixture.register();
    write_option_i32(&mut fixture, 0x1000, 1, 42);

    let value = fixture.value(option, 0x1000);
    let ctx = fixture.ctx();
    let mut synthetic = fixture.registry.synthetic(&value, &ctx).unwrap();

    assert!(!synthetic.is_ready());
    assert_eq!(synthetic.child_count(&ctx), 1);
    assert!(synthetic.is_ready());
}

#[test]
fn test_niche_enum_null_variant()
{
    let mut fixture = Fixture::new();
    let option = fixture.option_ref();
    fixture.register();
    fixture.memory.write_u64(Address::from(0x1000), 0);

    let value = fixture.value(option, 0x1000);
    assert_eq!(fixture.summary(&value).as_deref(), Some("None"));

    let ctx = fixture.ctx();
    let mut synthetic = fixture.registry.synthetic(&value, &ctx).unwrap();
    assert!(synthetic.update(&ctx));
    assert_eq!(synthetic.child_count(&ctx), 0);
    assert!(!synthetic.has_children(&ctx));
    assert!(matches!(
        synthetic.child_at(&ctx, 0),
        Err(FormatError::OutOfRange { index: 0, count: 0 })
    ));
}

#[test]
fn test_niche_enum_populated_variant()
{
    let mut fixture = Fixture::new();
    let option = fixture.option_ref();
    fixture.register();
    fixture.memory.write_u64(Address::from(0x1000), 0x2000);

    let value = fixture.value(option, 0x1000);
    assert_eq!(fixture.summary(&value).as_deref(), Some("Some(0x2000)"));

    let ctx = fixture.ctx();
    let mut synthetic = fixture.registry.synthetic(&value, &ctx).unwrap();
    assert!(synthetic.update(&ctx));
    assert_eq!(synthetic.child_count(&ctx), 1);
    assert_eq!(synthetic.child_at(&ctx, 0).unwrap().name(), Some("__0"));
    assert_eq!(synthetic.child_index(&ctx, "__0").unwrap(), 0);
}

#[test]
fn test_niche_enum_nested_discriminant()
{
    let mut fixture = Fixture::new();
    let option = fixture.option_box();
    fixture.register();
    fixture.memory.write_u64(Address::from(0x1000), 0);
    fixture.memory.write_u64(Address::from(0x2000), 0x5000);

    assert_eq!(
        fixture.summary(&fixture.value(option, 0x1000)).as_deref(),
        Some("None")
    );
    assert_eq!(
        fixture.summary(&fixture.value(option, 0x2000)).as_deref(),
        Some("Some({...})")
    );
}

#[test]
fn test_niche_enum_depth_limit()
{
    let mut fixture = Fixture::with_config(FormatterConfig {
        niche_depth_limit: 2,
        ..FormatterConfig::default()
    });
    let option = fixture.option_box();
    fixture.register();
    fixture.memory.write_u64(Address::from(0x1000), 0x5000);

    let value = fixture.value(option, 0x1000);
    assert!(fixture.summary(&value).is_none());

    let ctx = fixture.ctx();
    let mut synthetic = fixture.registry.synthetic(&value, &ctx).unwrap();
    assert!(!synthetic.update(&ctx));
    assert!(synthetic.is_broken());
}

#[test]
fn test_niche_enum_unreadable_discriminant()
{
    let mut fixture = Fixture::new();
    let option = fixture.option_ref();
    fixture.register();

    let value = fixture.value(option, 0x1000);
    let ctx = fixture.ctx();
    let mut synthetic = fixture.registry.synthetic(&value, &ctx).unwrap();
    assert!(!synthetic.update(&ctx));
    assert!(synthetic.summary(&ctx).is_none());
}

#[test]
fn test_singleton_enum_summary()
{
    let mut fixture = Fixture::new();
    let wrapper = fixture.singleton();
    fixture.register();
    fixture.write_i32s(0x1000, &[7]);

    let value = fixture.value(wrapper, 0x1000);
    assert_eq!(fixture.summary(&value).as_deref(), Some("7"));
}

#[test]
fn test_tuple_summary()
{
    let mut fixture = Fixture::new();
    let pair = fixture.pair();
    fixture.register();
    fixture.write_i32s(0x1000, &[1, -2]);

    let value = fixture.value(pair, 0x1000);
    assert_eq!(fixture.summary(&value).as_deref(), Some("(1, -2)"));
}

#[test]
fn test_tuple_summary_without_registration()
{
    let mut fixture = Fixture::new();
    let pair = fixture.pair();
    fixture.write_i32s(0x1000, &[1, -2]);

    let value = fixture.value(pair, 0x1000);
    assert!(fixture.summary(&value).is_none());
}
