
pub use channel::{ChannelCall, RecordingChannel};

use crate::{
    replacement::ClassReplacement,
    symbols::{MetadataRegistry, MethodAttributes, TypeDescriptor, TypeName, TypeSig},
};

const PUBLIC: MethodAttributes = MethodAttributes::PUBLIC;
const PUBLIC_STATIC: MethodAttributes = MethodAttributes::PUBLIC.union(MethodAttributes::STATIC);

pub fn object() -> TypeSig {
    TypeSig::named("System", "Object")
}

pub fn string() -> TypeSig {
    TypeSig::named("System", "String")
}

pub fn int32() -> TypeSig {
    TypeSig::named("System", "Int32")
}

pub fn double() -> TypeSig {
    TypeSig::named("System", "Double")
}

pub fn boolean() -> TypeSig {
    TypeSig::named("System", "Boolean")
}

pub fn math() -> TypeSig {
    TypeSig::named("System", "Math")
}

pub fn exception() -> TypeSig {
    TypeSig::named("System", "Exception")
}

pub fn mini_string() -> TypeSig {
    TypeSig::named("Embedded.Runtime", "MiniString")
}

pub fn mini_math() -> TypeSig {
    TypeSig::named("Embedded.Runtime", "MiniMath")
}

pub fn mini_exception() -> TypeSig {
    TypeSig::named("Embedded.Runtime", "MiniException")
}

pub fn type_param(index: u16) -> TypeSig {
    TypeSig::TypeParam(index)
}

pub fn list_def() -> TypeSig {
    TypeSig::definition("System.Collections.Generic", "List`1", 1)
}

pub fn list_of(arg: TypeSig) -> TypeSig {
    TypeSig::Generic {
        definition: TypeName::generic("System.Collections.Generic", "List`1", 1),
        args: vec![arg],
    }
}

pub fn mini_list(arg: TypeSig) -> TypeSig {
    TypeSig::Generic {
        definition: TypeName::generic("Embedded.Runtime", "MiniList`1", 1),
        args: vec![arg],
    }
}

pub fn dictionary_of(key: TypeSig, value: TypeSig) -> TypeSig {
    TypeSig::Generic {
        definition: TypeName::generic("System.Collections.Generic", "Dictionary`2", 2),
        args: vec![key, value],
    }
}

// Helper function to create the slice of the standard library used by the tests, with its
// embedded replacements
pub fn runtime_registry() -> MetadataRegistry {
    let registry = MetadataRegistry::new();
    let bytes = TypeSig::Array(Box::new(TypeSig::named("System", "Byte")));
    let items = TypeSig::Array(Box::new(type_param(0)));
    let empty_array = TypeSig::Array(Box::new(TypeSig::MethodParam(0)));

    registry.insert(
        TypeDescriptor::new(TypeName::new("System", "Object"))
            .with_constructor(vec![], PUBLIC)
            .with_method("ToString", vec![], string(), PUBLIC | MethodAttributes::VIRTUAL)
            .with_method("Equals", vec![object()], boolean(), PUBLIC | MethodAttributes::VIRTUAL)
            .with_method("GetHashCode", vec![], int32(), PUBLIC | MethodAttributes::VIRTUAL),
    );

    registry.insert(
        TypeDescriptor::new(TypeName::new("System", "String"))
            .with_base(object())
            .with_method("Concat", vec![string(), string()], string(), PUBLIC_STATIC)
            .with_method("get_Length", vec![], int32(), PUBLIC)
            .with_method("Trim", vec![], string(), PUBLIC)
            .with_method(
                "op_Equality",
                vec![string(), string()],
                boolean(),
                PUBLIC_STATIC | MethodAttributes::SPECIAL_NAME,
            )
            .with_method(
                "FastAllocate",
                vec![int32()],
                string(),
                MethodAttributes::PRIVATE | MethodAttributes::STATIC,
            )
            .with_field("_stringLength", int32(), false)
            .with_field("Empty", string(), true),
    );
    registry.insert(
        TypeDescriptor::new(TypeName::new("Embedded.Runtime", "MiniString"))
            .with_base(object())
            .with_method("Concat", vec![string(), string()], string(), PUBLIC_STATIC)
            .with_method("get_Length", vec![], int32(), PUBLIC)
            .with_method(
                "op_Equality",
                vec![mini_string(), mini_string()],
                boolean(),
                PUBLIC_STATIC | MethodAttributes::SPECIAL_NAME,
            )
            .with_method("Wipe", vec![], TypeSig::Void, PUBLIC)
            .with_field("_stringLength", int32(), false)
            .with_field("_data", bytes, false),
    );

    registry.insert(
        TypeDescriptor::new(TypeName::new("System", "Math"))
            .with_base(object())
            .with_method("Sqrt", vec![double()], double(), PUBLIC_STATIC)
            .with_method("Abs", vec![int32()], int32(), PUBLIC_STATIC),
    );
    registry.insert(
        TypeDescriptor::new(TypeName::new("Embedded.Runtime", "MiniMath"))
            .with_base(object())
            .with_method("Sqrt", vec![double()], double(), PUBLIC_STATIC)
            .with_method("NotSupportedException", vec![], TypeSig::Void, PUBLIC_STATIC),
    );

    registry.insert(
        TypeDescriptor::new(TypeName::new("System", "Exception"))
            .with_base(object())
            .with_constructor(vec![], PUBLIC)
            .with_constructor(vec![string()], PUBLIC)
            .with_method("get_Message", vec![], string(), PUBLIC | MethodAttributes::VIRTUAL),
    );
    registry.insert(
        TypeDescriptor::new(TypeName::new("System", "ArgumentException"))
            .with_base(exception())
            .with_constructor(vec![string()], PUBLIC),
    );
    registry.insert(
        TypeDescriptor::new(TypeName::new("Embedded.Runtime", "MiniException"))
            .with_base(object())
            .with_constructor(vec![], PUBLIC)
            .with_constructor(vec![string()], PUBLIC)
            .with_method("get_Message", vec![], string(), PUBLIC | MethodAttributes::VIRTUAL),
    );

    registry.insert(
        TypeDescriptor::new(TypeName::generic("System.Collections.Generic", "List`1", 1))
            .with_base(object())
            .with_constructor(vec![], PUBLIC)
            .with_method("Add", vec![type_param(0)], TypeSig::Void, PUBLIC)
            .with_method("get_Count", vec![], int32(), PUBLIC)
            .with_field("_size", int32(), false)
            .with_field("_items", items.clone(), false),
    );
    registry.insert(
        TypeDescriptor::new(TypeName::generic("Embedded.Runtime", "MiniList`1", 1))
            .with_base(object())
            .with_constructor(vec![], PUBLIC)
            .with_method("Add", vec![type_param(0)], TypeSig::Void, PUBLIC)
            .with_method("get_Count", vec![], int32(), PUBLIC)
            .with_field("_size", int32(), false)
            .with_field("_items", items, false),
    );

    registry.insert(
        TypeDescriptor::new(TypeName::new("System", "Array"))
            .with_base(object())
            .with_generic_method("Empty", 1, vec![], empty_array.clone(), PUBLIC_STATIC)
            .with_method("get_Length", vec![], int32(), PUBLIC),
    );
    registry.insert(
        TypeDescriptor::new(TypeName::new("Embedded.Runtime", "MiniArray"))
            .with_base(object())
            .with_generic_method("Empty", 1, vec![], empty_array, PUBLIC_STATIC)
            .with_method("get_Length", vec![], int32(), PUBLIC),
    );

    registry.insert(
        TypeDescriptor::new(TypeName::new("App", "Program"))
            .with_base(object())
            .with_method("Main", vec![], TypeSig::Void, PUBLIC_STATIC)
            .with_method("Helper", vec![int32()], int32(), PUBLIC_STATIC)
            .with_field("Table", bytes_of(), true),
    );

    registry
}

fn bytes_of() -> TypeSig {
    TypeSig::Array(Box::new(TypeSig::named("System", "Byte")))
}

// Helper function to create the replacement rules matching runtime_registry()
pub fn standard_rules() -> Vec<ClassReplacement> {
    let rule = |original: TypeSig, replacement: TypeSig, include_subclasses: bool| {
        ClassReplacement {
            original,
            replacement,
            include_subclasses,
            include_privates: false,
        }
    };

    vec![
        rule(string(), mini_string(), false),
        rule(math(), mini_math(), false),
        rule(exception(), mini_exception(), true),
        rule(
            list_def(),
            TypeSig::definition("Embedded.Runtime", "MiniList`1", 1),
            false,
        ),
        rule(
            TypeSig::named("System", "Array"),
            TypeSig::named("Embedded.Runtime", "MiniArray"),
            false,
        ),
    ]
}
