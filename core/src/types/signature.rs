use core::fmt::{self, Display};

use smallvec::SmallVec;

use crate::types::Type;

/// A calling convention: ordered parameter types plus a return type.
///
/// Equality is structural. Types are interned by the `TypeManager`, so
/// comparing two signatures is a walk over pointer-sized entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature<'a> {
    params: SmallVec<[&'a Type<'a>; 6]>,
    ret: &'a Type<'a>,
}

impl<'a> Signature<'a> {
    pub fn new(params: &[&'a Type<'a>], ret: &'a Type<'a>) -> Self {
        Signature {
            params: SmallVec::from_slice(params),
            ret,
        }
    }

    pub fn from_params(params: impl IntoIterator<Item = &'a Type<'a>>, ret: &'a Type<'a>) -> Self {
        Signature {
            params: params.into_iter().collect(),
            ret,
        }
    }

    pub fn params(&self) -> &[&'a Type<'a>] {
        &self.params
    }

    pub fn param(&self, index: usize) -> &'a Type<'a> {
        self.params[index]
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn last_param(&self) -> Option<&'a Type<'a>> {
        self.params.last().copied()
    }

    pub fn ret(&self) -> &'a Type<'a> {
        self.ret
    }

    pub fn with_param(&self, index: usize, ty: &'a Type<'a>) -> Self {
        let mut changed = self.clone();
        changed.params[index] = ty;
        changed
    }

    pub fn with_ret(&self, ret: &'a Type<'a>) -> Self {
        Signature {
            params: self.params.clone(),
            ret,
        }
    }

    pub fn with_params(&self, params: impl IntoIterator<Item = &'a Type<'a>>) -> Self {
        Signature::from_params(params, self.ret)
    }

    /// Total number of stack slots taken by all parameters.
    pub fn slot_count(&self) -> usize {
        self.slot_depth(0)
    }

    /// Number of slots taken by the parameters at `pos..`.
    ///
    /// Arguments are pushed left to right, so this is how deep parameter
    /// `pos` sits below the top of the stack (counting its own width).
    pub fn slot_depth(&self, pos: usize) -> usize {
        self.params[pos..].iter().map(|ty| ty.slot_size()).sum()
    }
}

impl Display for Signature<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, "){}", self.ret)
    }
}
