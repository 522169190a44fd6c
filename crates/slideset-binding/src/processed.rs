use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::BindingError;

/// Identity of the in-memory type a routine consumes or produces.
#[derive(Clone, Copy)]
pub struct ProcessedType {
    id: TypeId,
    name: &'static str,
}

impl ProcessedType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name, e.g. `alloc::string::String`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path, e.g. `String`.
    pub fn short_name(&self) -> &'static str {
        let head = self.name.find('<').unwrap_or(self.name.len());
        let start = self.name[..head].rfind("::").map(|i| i + 2).unwrap_or(0);
        &self.name[start..]
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for ProcessedType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ProcessedType {}

impl Hash for ProcessedType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ProcessedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessedType({})", self.name)
    }
}

impl fmt::Display for ProcessedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A type-erased processed value, tagged with its [`ProcessedType`].
pub struct Processed {
    ty: ProcessedType,
    value: Box<dyn Any + Send>,
}

impl Processed {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            ty: ProcessedType::of::<T>(),
            value: Box::new(value),
        }
    }

    pub fn processed_type(&self) -> ProcessedType {
        self.ty
    }

    pub fn is<T: Any>(&self) -> bool {
        self.ty.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast<T: Any>(self) -> Result<T, BindingError> {
        let found = self.ty.name();
        self.value
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| BindingError::ProcessedTypeMismatch {
                expected: std::any::type_name::<T>(),
                found,
            })
    }
}

impl fmt::Debug for Processed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Processed({})", self.ty.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn short_names_drop_module_paths() {
        assert_eq!(ProcessedType::of::<String>().short_name(), "String");
        assert_eq!(ProcessedType::of::<PathBuf>().short_name(), "PathBuf");
        assert_eq!(ProcessedType::of::<i32>().short_name(), "i32");
    }

    #[test]
    fn downcast_checks_type() {
        let p = Processed::new(42i32);
        assert!(p.is::<i32>());
        assert_eq!(p.downcast_ref::<i32>(), Some(&42));
        assert!(matches!(
            Processed::new(1.5f64).downcast::<i32>(),
            Err(BindingError::ProcessedTypeMismatch { .. })
        ));
        assert_eq!(Processed::new(String::from("a")).downcast::<String>().unwrap(), "a");
    }
}
