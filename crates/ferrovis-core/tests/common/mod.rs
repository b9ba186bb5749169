//! Hand-built type layouts and memory images, shaped the way rustc's legacy
//! debug info describes the standard library types.

#![allow(dead_code)]

use ferrovis_core::config::FormatterConfig;
use ferrovis_core::context::FormatContext;
use ferrovis_core::memory::MemorySnapshot;
use ferrovis_core::registry::{FormatterRegistry, RegistrationReport};
use ferrovis_core::types::{Address, CompileUnit, Field, Language, ScalarKind, TypeDescriptor, TypeId, TypeTable};
use ferrovis_core::value::Value;

pub struct Fixture
{
    pub types: TypeTable,
    pub memory: MemorySnapshot,
    pub registry: FormatterRegistry,
    declared: Vec<TypeId>,
}

impl Fixture
{
    pub fn new() -> Self
    {
        Self::with_config(FormatterConfig::default())
    }

    pub fn with_config(config: FormatterConfig) -> Self
    {
        Self {
            types: TypeTable::new(),
            memory: MemorySnapshot::new(),
            registry: FormatterRegistry::new(config),
            declared: Vec::new(),
        }
    }

    pub fn ctx(&self) -> FormatContext<'_>
    {
        FormatContext::new(&self.types, &self.memory, &self.registry)
    }

    /// Classify everything declared so far as one Rust compile unit
    pub fn register(&mut self) -> RegistrationReport
    {
        let unit = CompileUnit::new("src/main.rs", Language::Rust, self.declared.clone());
        self.registry.classify_and_register_all(&self.types, &[unit])
    }

    pub fn value(&self, ty: TypeId, address: u64) -> Value
    {
        Value::new(ty, Address::from(address)).named("value")
    }

    /// Summary through the installed formatters
    pub fn summary(&self, value: &Value) -> Option<String>
    {
        self.ctx().summary(value)
    }

    pub fn declare(&mut self, descriptor: TypeDescriptor) -> TypeId
    {
        if let Some(id) = self.types.lookup(&descriptor.name) {
            return id;
        }
        let id = self.types.insert(descriptor);
        self.declared.push(id);
        id
    }

    fn name_of(&self, id: TypeId) -> String
    {
        self.types.get(id).map(|descriptor| descriptor.name.clone()).unwrap_or_default()
    }

    // Primitives

    pub fn u8(&self) -> TypeId
    {
        self.types.byte_type()
    }

    pub fn i32(&mut self) -> TypeId
    {
        self.declare(TypeDescriptor::scalar("i32", ScalarKind::Signed, 4))
    }

    pub fn u32(&mut self) -> TypeId
    {
        self.declare(TypeDescriptor::scalar("u32", ScalarKind::Unsigned, 4))
    }

    pub fn usize(&mut self) -> TypeId
    {
        self.declare(TypeDescriptor::scalar("usize", ScalarKind::Unsigned, 8))
    }

    pub fn pointer(&mut self, target: TypeId) -> TypeId
    {
        let name = format!("*const {}", self.name_of(target));
        self.declare(TypeDescriptor::pointer(name, target, 8))
    }

    pub fn reference(&mut self, target: TypeId) -> TypeId
    {
        let name = format!("&{}", self.name_of(target));
        self.declare(TypeDescriptor::pointer(name, target, 8))
    }

    pub fn array(&mut self, element: TypeId, len: u64) -> TypeId
    {
        let element_name = self.name_of(element);
        let element_size = self.types.get(element).map_or(0, |descriptor| descriptor.byte_size);
        self.declare(TypeDescriptor::array(
            format!("{element_name}[{len}]"),
            element,
            len,
            element_size * len,
        ))
    }

    // Containers

    /// `Vec<T>`: `{ buf: RawVec { ptr: Unique { pointer: NonNull { __0 } }, cap }, len }`
    pub fn vec(&mut self, element: TypeId) -> TypeId
    {
        let element_name = self.name_of(element);
        let data = self.pointer(element);
        let usize = self.usize();
        let non_null = self.declare(TypeDescriptor::structure(
            format!("core::ptr::non_null::NonNull<{element_name}>"),
            8,
            vec![Field::named("__0", data, 0)],
        ));
        let unique = self.declare(TypeDescriptor::structure(
            format!("core::ptr::unique::Unique<{element_name}>"),
            8,
            vec![Field::named("pointer", non_null, 0)],
        ));
        let raw_vec = self.declare(TypeDescriptor::structure(
            format!("alloc::raw_vec::RawVec<{element_name}>"),
            16,
            vec![Field::named("ptr", unique, 0), Field::named("cap", usize, 8)],
        ));
        self.declare(TypeDescriptor::structure(
            format!("alloc::vec::Vec<{element_name}>"),
            24,
            vec![Field::named("buf", raw_vec, 0), Field::named("len", usize, 16)],
        ))
    }

    /// Fat reference `{ data_ptr, length }`
    pub fn fat_reference(&mut self, name: &str, element: TypeId) -> TypeId
    {
        let data = self.pointer(element);
        let usize = self.usize();
        self.declare(TypeDescriptor::structure(
            name,
            16,
            vec![Field::named("data_ptr", data, 0), Field::named("length", usize, 8)],
        ))
    }

    pub fn slice(&mut self, element: TypeId) -> TypeId
    {
        let name = format!("&[{}]", self.name_of(element));
        self.fat_reference(&name, element)
    }

    pub fn str_slice(&mut self) -> TypeId
    {
        let u8 = self.u8();
        self.fat_reference("&str", u8)
    }

    pub fn string(&mut self) -> TypeId
    {
        let u8 = self.u8();
        let bytes = self.vec(u8);
        self.declare(TypeDescriptor::structure(
            "alloc::string::String",
            24,
            vec![Field::named("vec", bytes, 0)],
        ))
    }

    pub fn cstring(&mut self) -> TypeId
    {
        let u8 = self.u8();
        let boxed = self.fat_reference("alloc::boxed::Box<[u8]>", u8);
        self.declare(TypeDescriptor::structure(
            "std::ffi::c_str::CString",
            16,
            vec![Field::named("inner", boxed, 0)],
        ))
    }

    pub fn os_string(&mut self) -> TypeId
    {
        let u8 = self.u8();
        let bytes = self.vec(u8);
        let buf = self.declare(TypeDescriptor::structure(
            "std::sys::os_str::bytes::Buf",
            24,
            vec![Field::named("inner", bytes, 0)],
        ));
        self.declare(TypeDescriptor::structure(
            "std::ffi::os_str::OsString",
            24,
            vec![Field::named("inner", buf, 0)],
        ))
    }

    pub fn path_buf(&mut self) -> TypeId
    {
        let os_string = self.os_string();
        self.declare(TypeDescriptor::structure(
            "std::path::PathBuf",
            24,
            vec![Field::named("inner", os_string, 0)],
        ))
    }

    /// Unsized type whose debug info has no members (`CStr`, `OsStr`, `Path`)
    pub fn unsized_type(&mut self, name: &str) -> TypeId
    {
        self.declare(TypeDescriptor::structure(name, 16, Vec::new()))
    }

    // Enums and tuples

    /// Regular `Option<i32>`: a union of `None` and `Some` variant structs
    pub fn option_i32(&mut self) -> TypeId
    {
        let u32 = self.u32();
        let i32 = self.i32();
        let none = self.declare(TypeDescriptor::structure(
            "core::option::None",
            8,
            vec![Field::named("RUST$ENUM$DISR", u32, 0)],
        ));
        let some = self.declare(TypeDescriptor::structure(
            "core::option::Some",
            8,
            vec![Field::named("RUST$ENUM$DISR", u32, 0), Field::named("__0", i32, 4)],
        ));
        self.declare(TypeDescriptor::union(
            "core::option::Option<i32>",
            8,
            vec![Field::named("None", none, 0), Field::named("Some", some, 0)],
        ))
    }

    /// Regular enum with struct-like variants
    pub fn shape(&mut self) -> TypeId
    {
        let u32 = self.u32();
        let circle = self.declare(TypeDescriptor::structure(
            "demo::Circle",
            12,
            vec![Field::named("RUST$ENUM$DISR", u32, 0), Field::named("radius", u32, 4)],
        ));
        let rect = self.declare(TypeDescriptor::structure(
            "demo::Rect",
            12,
            vec![
                Field::named("RUST$ENUM$DISR", u32, 0),
                Field::named("w", u32, 4),
                Field::named("h", u32, 8),
            ],
        ));
        self.declare(TypeDescriptor::union(
            "demo::Shape",
            12,
            vec![Field::named("Circle", circle, 0), Field::named("Rect", rect, 0)],
        ))
    }

    /// Niche-optimized `Option<&i32>`: null reference means `None`
    pub fn option_ref(&mut self) -> TypeId
    {
        let i32 = self.i32();
        let reference = self.reference(i32);
        let some = self.declare(TypeDescriptor::structure(
            "core::option::Some<&i32>",
            8,
            vec![Field::named("__0", reference, 0)],
        ));
        self.declare(TypeDescriptor::union(
            "core::option::Option<&i32>",
            8,
            vec![Field::named("RUST$ENCODED$ENUM$0$None", some, 0)],
        ))
    }

    /// Niche-optimized `Option<Box<u8>>`; the niche sits three wrapper
    /// structs below the variant's field
    pub fn option_box(&mut self) -> TypeId
    {
        let u8 = self.u8();
        let data = self.pointer(u8);
        let non_null = self.declare(TypeDescriptor::structure(
            "core::ptr::non_null::NonNull<u8>",
            8,
            vec![Field::named("pointer", data, 0)],
        ));
        let unique = self.declare(TypeDescriptor::structure(
            "core::ptr::unique::Unique<u8>",
            8,
            vec![Field::named("pointer", non_null, 0)],
        ));
        let boxed = self.declare(TypeDescriptor::structure(
            "alloc::boxed::Box<u8>",
            8,
            vec![Field::named("inner", unique, 0)],
        ));
        let some = self.declare(TypeDescriptor::structure(
            "core::option::Some<Box<u8>>",
            8,
            vec![Field::named("__0", boxed, 0)],
        ));
        self.declare(TypeDescriptor::union(
            "core::option::Option<Box<u8>>",
            8,
            vec![Field::named("RUST$ENCODED$ENUM$0$None", some, 0)],
        ))
    }

    /// Single-variant enum around an `i32`
    pub fn singleton(&mut self) -> TypeId
    {
        let i32 = self.i32();
        self.declare(TypeDescriptor::union("demo::Wrapper", 4, vec![Field::positional(i32, 0)]))
    }

    /// Tuple struct `(i32, i32)`
    pub fn pair(&mut self) -> TypeId
    {
        let i32 = self.i32();
        self.declare(TypeDescriptor::structure(
            "demo::Pair",
            8,
            vec![Field::named("__0", i32, 0), Field::named("__1", i32, 4)],
        ))
    }

    // Memory

    pub fn write_vec(&mut self, at: u64, data: u64, len: u64)
    {
        self.memory.write_bytes(Address::from(at), &[0; 24]);
        self.memory.write_u64(Address::from(at), data);
        self.memory.write_u64(Address::from(at + 8), len);
        self.memory.write_u64(Address::from(at + 16), len);
    }

    pub fn write_fat(&mut self, at: u64, data: u64, len: u64)
    {
        self.memory.write_bytes(Address::from(at), &[0; 16]);
        self.memory.write_u64(Address::from(at), data);
        self.memory.write_u64(Address::from(at + 8), len);
    }

    pub fn write_i32s(&mut self, at: u64, values: &[i32])
    {
        let bytes: Vec<u8> = values.iter().flat_map(|value| value.to_le_bytes()).collect();
        self.memory.add_region(Address::from(at), bytes);
    }
}
