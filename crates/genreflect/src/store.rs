//! Declaration metadata: the [`TypeEnv`] capability and the in-memory
//! [`TypeStore`] implementation.
//!
//! The resolution engine only ever *reads* metadata, and it does so through
//! `TypeEnv`; any host with equivalent introspection (a classfile loader, a
//! syntax-tree lowering, a test fixture) can implement it. `TypeStore` is the
//! canonical implementation used by fixtures and by hosts that assemble
//! declarations programmatically.

use std::collections::HashMap;

use crate::annotated::AnnotatedType;
use crate::ty::{
    AnnotationId, ClassId, ConstructorId, FieldId, MethodId, Type, TypeVarId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
}

/// A class-like declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    /// Declared type parameters, in declaration order.
    pub type_params: Vec<TypeVarId>,
    /// Generic superclass expression; `None` for interfaces and the top type.
    pub super_class: Option<Type>,
    /// Generic interface expressions, in declaration order.
    pub interfaces: Vec<Type>,
    /// Immediately enclosing declaration, for nested classes.
    pub enclosing: Option<ClassId>,
    /// Whether this is a member (non-static nested) declaration. Only member
    /// declarations see the enclosing declaration's type parameters.
    pub is_inner: bool,
    /// Declaration-site type-use markers; canonicalization lifts these onto
    /// the corresponding owner-chain nodes.
    pub annotations: Vec<AnnotationId>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
    pub constructors: Vec<ConstructorDef>,
}

impl ClassDef {
    /// An empty declaration, handy as the tail of a struct-update expression.
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            enclosing: None,
            is_inner: false,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }
}

/// A type-parameter declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: String,
    /// Declaring class; `None` for method-level and capture variables.
    pub declared_in: Option<ClassId>,
    /// Ordered upper bounds. Empty means unbounded, i.e. the top type.
    pub upper_bounds: Vec<Type>,
    /// Declaration-site type-use markers on the parameter itself.
    pub annotations: Vec<AnnotationId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: AnnotatedType,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    /// Method-level type parameters, in declaration order.
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<AnnotatedType>,
    pub return_type: AnnotatedType,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDef {
    pub params: Vec<AnnotatedType>,
}

/// Declarations the engine needs independently of any particular hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellKnownTypes {
    /// The top type; erasure of unbounded variables and wildcards.
    pub object: ClassId,
}

/// Read-only reflective metadata, as seen by the resolution engine.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;

    fn field(&self, id: FieldId) -> Option<&FieldDef> {
        self.class(id.class)?.fields.get(id.index)
    }

    fn method(&self, id: MethodId) -> Option<&MethodDef> {
        self.class(id.class)?.methods.get(id.index)
    }

    fn constructor(&self, id: ConstructorId) -> Option<&ConstructorDef> {
        self.class(id.class)?.constructors.get(id.index)
    }
}

/// In-memory [`TypeEnv`] with interning for classes and annotations.
#[derive(Debug)]
pub struct TypeStore {
    classes: Vec<Option<ClassDef>>,
    class_ids: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    annotations: Vec<String>,
    annotation_ids: HashMap<String, AnnotationId>,
    well_known: WellKnownTypes,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    /// An empty store with only `java.lang.Object` defined.
    pub fn new() -> Self {
        let mut store = Self {
            classes: Vec::new(),
            class_ids: HashMap::new(),
            type_params: Vec::new(),
            annotations: Vec::new(),
            annotation_ids: HashMap::new(),
            well_known: WellKnownTypes { object: ClassId(0) },
        };
        let object = store.add_class(ClassDef::new("java.lang.Object", ClassKind::Class));
        store.well_known = WellKnownTypes { object };
        store
    }

    /// A store seeded with the handful of JDK declarations the tests lean on.
    pub fn with_minimal_jdk() -> Self {
        let mut store = Self::new();
        let object = store.well_known.object;
        let obj = Type::raw(object);

        for name in [
            "java.lang.String",
            "java.lang.Number",
        ] {
            store.add_class(ClassDef {
                super_class: Some(obj.clone()),
                ..ClassDef::new(name, ClassKind::Class)
            });
        }
        let number = Type::raw(store.class_id("java.lang.Number").unwrap());
        for name in ["java.lang.Integer", "java.lang.Long", "java.lang.Double"] {
            store.add_class(ClassDef {
                super_class: Some(number.clone()),
                ..ClassDef::new(name, ClassKind::Class)
            });
        }

        let collection = store.intern_class_id("java.util.Collection");
        let collection_e = store.add_type_param("E", Some(collection), vec![]);
        store.define_class(
            collection,
            ClassDef {
                type_params: vec![collection_e],
                ..ClassDef::new("java.util.Collection", ClassKind::Interface)
            },
        );

        for name in ["java.util.List", "java.util.Set"] {
            let id = store.intern_class_id(name);
            let e = store.add_type_param("E", Some(id), vec![]);
            store.define_class(
                id,
                ClassDef {
                    type_params: vec![e],
                    interfaces: vec![Type::class(collection, vec![Type::TypeVar(e)])],
                    ..ClassDef::new(name, ClassKind::Interface)
                },
            );
        }

        let list = store.class_id("java.util.List").unwrap();
        let array_list = store.intern_class_id("java.util.ArrayList");
        let array_list_e = store.add_type_param("E", Some(array_list), vec![]);
        store.define_class(
            array_list,
            ClassDef {
                type_params: vec![array_list_e],
                super_class: Some(obj.clone()),
                interfaces: vec![Type::class(list, vec![Type::TypeVar(array_list_e)])],
                ..ClassDef::new("java.util.ArrayList", ClassKind::Class)
            },
        );

        let map = store.intern_class_id("java.util.Map");
        let map_k = store.add_type_param("K", Some(map), vec![]);
        let map_v = store.add_type_param("V", Some(map), vec![]);
        store.define_class(
            map,
            ClassDef {
                type_params: vec![map_k, map_v],
                ..ClassDef::new("java.util.Map", ClassKind::Interface)
            },
        );

        let optional = store.intern_class_id("java.util.Optional");
        let optional_t = store.add_type_param("T", Some(optional), vec![]);
        store.define_class(
            optional,
            ClassDef {
                type_params: vec![optional_t],
                super_class: Some(obj),
                ..ClassDef::new("java.util.Optional", ClassKind::Class)
            },
        );

        store
    }

    /// Define a new class, interning its name.
    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let name = def.name.clone();
        let id = self.intern_class_id(&name);
        self.define_class(id, def);
        id
    }

    /// Reserve an id for `name` without defining it yet; later `define_class`
    /// fills it in. Needed when declarations reference each other.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.class_ids.get(name) {
            return *id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(None);
        self.class_ids.insert(name.to_string(), id);
        id
    }

    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        self.classes[id.0 as usize] = Some(def);
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.0 as usize)?.as_mut()
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_ids.get(name).copied()
    }

    pub fn add_type_param(
        &mut self,
        name: impl Into<String>,
        declared_in: Option<ClassId>,
        upper_bounds: Vec<Type>,
    ) -> TypeVarId {
        let id = TypeVarId::new(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.into(),
            declared_in,
            upper_bounds,
            annotations: Vec::new(),
        });
        id
    }

    pub fn type_param_mut(&mut self, id: TypeVarId) -> Option<&mut TypeParamDef> {
        self.type_params.get_mut(id.store_index()?)
    }

    pub fn add_annotation(&mut self, name: &str) -> AnnotationId {
        if let Some(id) = self.annotation_ids.get(name) {
            return *id;
        }
        let id = AnnotationId(self.annotations.len() as u32);
        self.annotations.push(name.to_string());
        self.annotation_ids.insert(name.to_string(), id);
        id
    }

    pub fn annotation_name(&self, id: AnnotationId) -> Option<&str> {
        self.annotations.get(id.0 as usize).map(String::as_str)
    }

    /// First method of `class` with the given name.
    pub fn method_id(&self, class: ClassId, name: &str) -> Option<MethodId> {
        let def = self.class(class)?;
        let index = def.methods.iter().position(|m| m.name == name)?;
        Some(MethodId { class, index })
    }

    pub fn field_id(&self, class: ClassId, name: &str) -> Option<FieldId> {
        let def = self.class(class)?;
        let index = def.fields.iter().position(|f| f.name == name)?;
        Some(FieldId { class, index })
    }

    pub fn constructor_id(&self, class: ClassId, index: usize) -> Option<ConstructorId> {
        self.class(class)?.constructors.get(index)?;
        Some(ConstructorId { class, index })
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize)?.as_ref()
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.store_index()?)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_id(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}
