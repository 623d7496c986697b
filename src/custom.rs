use std::{
    any::Any,
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

#[derive(Clone)]
/// An identity token standing in for a host class.
///
/// Equality and hashing follow the allocation, not the contents: two handles
/// denote the same class only if one was cloned from the other. The optional
/// name is purely for diagnostics and registration defaults.
///
/// # Example
///
/// ```
/// use tangle::ClassHandle;
///
/// let a = ClassHandle::named("point");
/// let b = a.clone();
/// assert_eq!(a, b);
/// assert_ne!(a, ClassHandle::named("point"));
/// ```
pub struct ClassHandle(Rc<ClassInfo>);

struct ClassInfo {
    name: Option<String>,
}

impl ClassHandle {
    /// Creates a fresh anonymous identity.
    pub fn new() -> ClassHandle { ClassHandle(Rc::new(ClassInfo { name: None })) }

    /// Creates a fresh identity carrying a name; the name doubles as the
    /// default registration name.
    pub fn named(name: impl Into<String>) -> ClassHandle {
        ClassHandle(Rc::new(ClassInfo {
            name: Some(name.into()),
        }))
    }

    /// The handle's name, if it was created with one.
    pub fn name(&self) -> Option<&str> { self.0.name.as_deref() }

    pub(crate) fn key(&self) -> usize { Rc::as_ptr(&self.0) as usize }
}

impl Default for ClassHandle {
    fn default() -> ClassHandle { ClassHandle::new() }
}

impl PartialEq for ClassHandle {
    fn eq(&self, other: &ClassHandle) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl Eq for ClassHandle {}

impl Hash for ClassHandle {
    fn hash<H: Hasher>(&self, state: &mut H) { self.key().hash(state) }
}

impl fmt::Debug for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "ClassHandle({:?})", name),
            None => write!(f, "ClassHandle({:#x})", self.key()),
        }
    }
}

/// Resolves which identity token represents a host class at registration.
///
/// The default policy is "the class value itself is the identity", which is
/// what the blanket implementation on [`ClassHandle`] does. Hosts that keep
/// a separate instance-descriptor per class implement this on their class
/// wrapper instead.
pub trait ClassDescriptor {
    /// The identity instances of this class are tagged with.
    fn instance_class(&self) -> ClassHandle;

    /// A default registration name, if the class carries one.
    fn class_name(&self) -> Option<&str> { None }
}

impl ClassDescriptor for ClassHandle {
    fn instance_class(&self) -> ClassHandle { self.clone() }

    fn class_name(&self) -> Option<&str> { self.name() }
}

/// An opaque host value tagged with its class.
///
/// The codec never looks inside `data`; a registered encode callback turns
/// it into reconstruction arguments and a decode callback rebuilds it.
pub struct Custom {
    class: ClassHandle,
    data: Box<dyn Any>,
}

impl Custom {
    /// Wraps host data under a class identity.
    pub fn new(class: ClassHandle, data: impl Any) -> Custom {
        Custom {
            class,
            data: Box::new(data),
        }
    }

    /// The class this value is tagged with.
    pub fn class(&self) -> &ClassHandle { &self.class }

    /// Borrows the host data as `T`, if that is what it is.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> { self.data.downcast_ref() }

    /// Wraps the value in the shared handle [`crate::Value::Custom`] expects.
    pub fn into_ref(self) -> Rc<Custom> { Rc::new(self) }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Custom({:?})", self.class)
    }
}

/// An opaque procedure body holder.
///
/// Procedures only travel when the codec instance carries the host
/// dump/load hook pair; without hooks they are rejected on both sides.
pub struct Proc {
    data: Box<dyn Any>,
}

impl Proc {
    /// Wraps an opaque procedure body.
    pub fn new(data: impl Any) -> Proc { Proc { data: Box::new(data) } }

    /// Borrows the body as `T`, if that is what it is.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> { self.data.downcast_ref() }

    /// Wraps the value in the shared handle [`crate::Value::Proc`] expects.
    pub fn into_ref(self) -> Rc<Proc> { Rc::new(self) }
}

impl fmt::Debug for Proc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "Proc") }
}
