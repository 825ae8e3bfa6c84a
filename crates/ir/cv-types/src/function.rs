//! Function declarations

use crate::definition::TypeDefId;
use crate::ty::Type;
use cv_intern::Symbol;
use cv_span::FileSpan;

/// Unique ID for a function inside a package
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct FunctionId(pub u32);

/// What kind of callable a function is
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum FunctionKind {
    /// Free function
    Function,
    /// Instance method of a class
    ObjectMethod,
    /// Initializer of a class
    ObjectInitializer,
    /// Deinitializer of a class
    Deinitializer,
    /// Instance method of a value type
    ValueTypeMethod,
    /// Initializer of a value type
    ValueTypeInitializer,
    /// Type method, called on the type itself
    ClassMethod,
    /// Closure body
    Closure,
}

/// Implicit first parameter passed to a function
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Receiver {
    /// No implicit receiver
    None,
    /// Pointer to the object
    Object,
    /// Pointer to the value type instance
    Value,
    /// Pointer to the class info of the type the method was called on
    TypeInfo,
    /// Pointer to the closure's capture storage
    Capture,
}

impl FunctionKind {
    /// Whether a body of this kind sees the owner's instance variables
    pub fn has_instance_scope(self) -> bool {
        matches!(
            self,
            Self::ObjectMethod
                | Self::ObjectInitializer
                | Self::Deinitializer
                | Self::ValueTypeMethod
                | Self::ValueTypeInitializer
        )
    }

    /// Implicit receiver of this kind
    pub fn receiver(self) -> Receiver {
        match self {
            Self::Function => Receiver::None,
            Self::ObjectMethod | Self::ObjectInitializer | Self::Deinitializer => Receiver::Object,
            Self::ValueTypeMethod | Self::ValueTypeInitializer => Receiver::Value,
            Self::ClassMethod => Receiver::TypeInfo,
            Self::Closure => Receiver::Capture,
        }
    }
}

/// A declared parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name
    pub name: Symbol,
    /// Declared type
    pub ty: Type,
    /// Whether the body may reassign the parameter
    pub mutable: bool,
    /// Declaration site
    pub span: FileSpan,
}

/// A function, method, initializer or closure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Declared name
    pub name: Symbol,
    /// Kind of callable
    pub kind: FunctionKind,
    /// Type definition the function belongs to, if any
    pub owner: Option<TypeDefId>,
    /// Declared parameters
    pub parameters: Vec<Parameter>,
    /// Return type
    pub return_type: Type,
    /// Names of the function's own generic parameters
    pub generic_params: Vec<Symbol>,
    /// Error type for functions that can raise
    pub error_type: Option<Type>,
    /// Declaration site
    pub span: FileSpan,
}

impl Function {
    /// A function of `kind` with no parameters returning `return_type`
    pub fn new(name: Symbol, kind: FunctionKind, return_type: Type, span: FileSpan) -> Self {
        Self {
            name,
            kind,
            owner: None,
            parameters: Vec::new(),
            return_type,
            generic_params: Vec::new(),
            error_type: None,
            span,
        }
    }

    /// Attach the function to a type definition
    #[must_use]
    pub fn with_owner(mut self, owner: TypeDefId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Append a parameter
    #[must_use]
    pub fn with_parameter(mut self, name: Symbol, ty: Type, mutable: bool) -> Self {
        let span = self.span;
        self.parameters.push(Parameter {
            name,
            ty,
            mutable,
            span,
        });
        self
    }

    /// Declare the function's own generic parameters
    #[must_use]
    pub fn with_generic_params(mut self, params: Vec<Symbol>) -> Self {
        self.generic_params = params;
        self
    }

    /// Mark the function as able to raise `error_type`
    #[must_use]
    pub fn with_error_type(mut self, error_type: Type) -> Self {
        self.error_type = Some(error_type);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_scope_kinds() {
        assert!(FunctionKind::ObjectMethod.has_instance_scope());
        assert!(FunctionKind::ValueTypeInitializer.has_instance_scope());
        assert!(!FunctionKind::Function.has_instance_scope());
        assert!(!FunctionKind::ClassMethod.has_instance_scope());
        assert!(!FunctionKind::Closure.has_instance_scope());
    }

    #[test]
    fn test_receivers() {
        assert_eq!(FunctionKind::Function.receiver(), Receiver::None);
        assert_eq!(FunctionKind::Deinitializer.receiver(), Receiver::Object);
        assert_eq!(FunctionKind::ValueTypeMethod.receiver(), Receiver::Value);
        assert_eq!(FunctionKind::ClassMethod.receiver(), Receiver::TypeInfo);
        assert_eq!(FunctionKind::Closure.receiver(), Receiver::Capture);
    }
}
