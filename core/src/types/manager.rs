use crate::types::{Class, Primitive, Signature, Type};
use bumpalo::Bump;
use core::cell::RefCell;
use hashbrown::{DefaultHashBuilder, HashMap};

/// Well-known types every adapter plan may need.
///
/// This is plain data (only shared references into the arena), so unlike the
/// `TypeManager` itself it can be shared freely between threads. Planning
/// code only ever sees `Builtins`.
#[derive(Debug)]
pub struct Builtins<'a> {
    pub void: &'a Type<'a>,
    pub null: &'a Type<'a>,
    pub object: &'a Type<'a>,
    pub number: &'a Type<'a>,
    pub string: &'a Type<'a>,
    primitives: [&'a Type<'a>; 8],
    wrappers: [&'a Type<'a>; 8],
}

impl<'a> Builtins<'a> {
    pub fn primitive(&self, prim: Primitive) -> &'a Type<'a> {
        self.primitives[prim.index()]
    }

    /// The reference class boxing `prim` (e.g. `Integer` for `int`).
    pub fn wrapper(&self, prim: Primitive) -> &'a Type<'a> {
        self.wrappers[prim.index()]
    }
}

pub struct TypeManager<'a> {
    // Arena holding all types from this TypeManager.
    arena: &'a Bump,
    builtins: &'a Builtins<'a>,
    classes: RefCell<HashMap<&'a str, &'a Type<'a>, DefaultHashBuilder, &'a Bump>>,
    arrays: RefCell<HashMap<&'a Type<'a>, &'a Type<'a>, DefaultHashBuilder, &'a Bump>>,
}

fn alloc_class<'a>(
    arena: &'a Bump,
    name: &str,
    superclass: Option<&'a Type<'a>>,
    interfaces: &[&'a Type<'a>],
    is_interface: bool,
    unboxes_to: Option<Primitive>,
) -> &'a Type<'a> {
    let class = arena.alloc(Class {
        name: arena.alloc_str(name),
        superclass,
        interfaces: arena.alloc_slice_copy(interfaces),
        is_interface,
        unboxes_to,
    });
    arena.alloc(Type::Class(class))
}

impl<'a> TypeManager<'a> {
    pub fn new(arena: &'a Bump) -> &'a Self {
        let object = alloc_class(arena, "Object", None, &[], false, None);
        let number = alloc_class(arena, "Number", Some(object), &[], false, None);
        let string = alloc_class(arena, "String", Some(object), &[], false, None);

        let primitives = Primitive::ALL.map(|prim| &*arena.alloc(Type::Primitive(prim)));
        let wrappers = Primitive::ALL.map(|prim| {
            let superclass = match prim {
                Primitive::Boolean | Primitive::Char => object,
                _ => number,
            };
            alloc_class(
                arena,
                prim.wrapper_name(),
                Some(superclass),
                &[],
                false,
                Some(prim),
            )
        });

        let builtins = arena.alloc(Builtins {
            void: arena.alloc(Type::Void),
            null: arena.alloc(Type::Null),
            object,
            number,
            string,
            primitives,
            wrappers,
        });

        let mut classes = HashMap::new_in(arena);
        for ty in [object, number, string].into_iter().chain(wrappers) {
            if let Type::Class(class) = ty {
                classes.insert(class.name, ty);
            }
        }

        arena.alloc(Self {
            arena,
            builtins,
            classes: RefCell::new(classes),
            arrays: RefCell::new(HashMap::new_in(arena)),
        })
    }

    pub fn builtins(&self) -> &'a Builtins<'a> {
        self.builtins
    }

    // Factory methods for types.
    pub fn void(&self) -> &'a Type<'a> {
        self.builtins.void
    }
    pub fn null(&self) -> &'a Type<'a> {
        self.builtins.null
    }
    pub fn object(&self) -> &'a Type<'a> {
        self.builtins.object
    }
    pub fn string(&self) -> &'a Type<'a> {
        self.builtins.string
    }
    pub fn primitive(&self, prim: Primitive) -> &'a Type<'a> {
        self.builtins.primitive(prim)
    }
    pub fn boolean(&self) -> &'a Type<'a> {
        self.primitive(Primitive::Boolean)
    }
    pub fn byte(&self) -> &'a Type<'a> {
        self.primitive(Primitive::Byte)
    }
    pub fn char(&self) -> &'a Type<'a> {
        self.primitive(Primitive::Char)
    }
    pub fn short(&self) -> &'a Type<'a> {
        self.primitive(Primitive::Short)
    }
    pub fn int(&self) -> &'a Type<'a> {
        self.primitive(Primitive::Int)
    }
    pub fn long(&self) -> &'a Type<'a> {
        self.primitive(Primitive::Long)
    }
    pub fn float(&self) -> &'a Type<'a> {
        self.primitive(Primitive::Float)
    }
    pub fn double(&self) -> &'a Type<'a> {
        self.primitive(Primitive::Double)
    }
    pub fn wrapper(&self, prim: Primitive) -> &'a Type<'a> {
        self.builtins.wrapper(prim)
    }

    /// Looks up a class or interface previously registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&'a Type<'a>> {
        self.classes.borrow().get(name).copied()
    }

    /// Registers a class. Names are unique: registering an existing name
    /// returns the first registration unchanged.
    pub fn class(
        &self,
        name: &str,
        superclass: Option<&'a Type<'a>>,
        interfaces: &[&'a Type<'a>],
    ) -> &'a Type<'a> {
        self.intern_class(name, Some(superclass.unwrap_or(self.object())), interfaces, false)
    }

    pub fn interface(&self, name: &str, extends: &[&'a Type<'a>]) -> &'a Type<'a> {
        self.intern_class(name, None, extends, true)
    }

    fn intern_class(
        &self,
        name: &str,
        superclass: Option<&'a Type<'a>>,
        interfaces: &[&'a Type<'a>],
        is_interface: bool,
    ) -> &'a Type<'a> {
        if let Some(existing) = self.lookup(name) {
            return existing;
        }
        let ty = alloc_class(self.arena, name, superclass, interfaces, is_interface, None);
        if let Type::Class(class) = ty {
            self.classes.borrow_mut().insert(class.name, ty);
        }
        ty
    }

    pub fn array(&self, elem_ty: &'a Type<'a>) -> &'a Type<'a> {
        if let Some(&interned_ty) = self.arrays.borrow().get(elem_ty) {
            return interned_ty;
        }
        let arena_ty = self.arena.alloc(Type::Array(elem_ty));
        self.arrays.borrow_mut().insert(elem_ty, arena_ty);
        arena_ty
    }

    pub fn signature(&self, params: &[&'a Type<'a>], ret: &'a Type<'a>) -> Signature<'a> {
        Signature::new(params, ret)
    }
}
