//! The [`record!`] macro.

/// Declare a struct and implement [`Record`](crate::Record) and
/// [`Field`](crate::Field) for it.
///
/// Each field may carry one `#[csv(...)]` attribute with an optional column-name
/// override (`name`) and an optional default string (`default`), in either order:
///
/// ```
/// csvbind::record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Address {
///         #[csv(name = "street")]
///         pub street: String,
///         #[csv(name = "city", default = "Springfield")]
///         pub city: String,
///     }
/// }
///
/// csvbind::record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Person {
///         #[csv(name = "name")]
///         pub name: String,
///         #[csv(default = "18")]
///         pub age: u32,
///         /// Flattened into `address_street` and `address_city`.
///         #[csv(name = "address")]
///         pub address: Address,
///         pub billing: Option<Address>,
///     }
/// }
///
/// let headers = csvbind::headers::<Person>().unwrap();
/// assert_eq!(
///     headers,
///     ["name", "age", "address_street", "address_city", "billing_street", "billing_city"]
/// );
/// ```
///
/// Field types must implement [`Field`](crate::Field): the primitive scalars,
/// other `record!` types, `Box<T>` and `Option<T>` of those. Only doc comments are
/// accepted as additional field attributes; generic and tuple structs are not
/// supported.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[doc = $doc:literal])*
                $(#[csv($($key:ident = $value:literal),* $(,)?)])?
                $fvis:vis $fname:ident : $fty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[doc = $doc])*
                $fvis $fname: $fty,
            )*
        }

        impl $crate::Record for $name {
            fn shape() -> $crate::Shape {
                $crate::Shape::new(
                    ::core::any::type_name::<Self>(),
                    ::std::vec![
                        $(
                            $crate::FieldDef::new(
                                ::core::stringify!($fname),
                                <$fty as $crate::Field>::kind(),
                            )
                            .with_tag($crate::__record_attr!(name; $($($key = $value),*)?))
                            .with_default($crate::__record_attr!(default; $($($key = $value),*)?)),
                        )*
                    ],
                )
            }

            fn materialize() -> Self {
                Self {
                    $($fname: <$fty as $crate::Field>::materialize(),)*
                }
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field(&self, index: usize) -> ::core::option::Option<$crate::FieldRef<'_>> {
                let mut at = 0usize;
                $(
                    if index == at {
                        return ::core::option::Option::Some($crate::Field::get(&self.$fname));
                    }
                    at += 1;
                )*
                ::core::option::Option::None
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn assign(
                &mut self,
                index: usize,
                value: $crate::Scalar,
            ) -> ::core::result::Result<(), $crate::AssignError> {
                let mut at = 0usize;
                $(
                    if index == at {
                        return $crate::Field::set(&mut self.$fname, value);
                    }
                    at += 1;
                )*
                ::core::result::Result::Err($crate::AssignError::NotScalar)
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn nested_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn $crate::Record> {
                let mut at = 0usize;
                $(
                    if index == at {
                        return $crate::Field::nested_mut(&mut self.$fname);
                    }
                    at += 1;
                )*
                ::core::option::Option::None
            }
        }

        impl $crate::Field for $name {
            fn kind() -> $crate::FieldKind {
                $crate::FieldKind::Nested {
                    shape: <Self as $crate::Record>::shape,
                    optional: false,
                }
            }

            fn materialize() -> Self {
                <Self as $crate::Record>::materialize()
            }

            fn get(&self) -> $crate::FieldRef<'_> {
                $crate::FieldRef::Nested(::core::option::Option::Some(self))
            }

            fn nested_mut(&mut self) -> ::core::option::Option<&mut dyn $crate::Record> {
                ::core::option::Option::Some(self)
            }
        }
    };
}

/// Pick one key out of a `#[csv(...)]` attribute.
#[doc(hidden)]
#[macro_export]
macro_rules! __record_attr {
    ($want:ident;) => {
        ::core::option::Option::None
    };
    (name; name = $value:literal $(, $($rest:tt)*)?) => {
        ::core::option::Option::Some($value)
    };
    (default; default = $value:literal $(, $($rest:tt)*)?) => {
        ::core::option::Option::Some($value)
    };
    ($want:ident; name = $value:literal $(, $($rest:tt)*)?) => {
        $crate::__record_attr!($want; $($($rest)*)?)
    };
    ($want:ident; default = $value:literal $(, $($rest:tt)*)?) => {
        $crate::__record_attr!($want; $($($rest)*)?)
    };
    ($want:ident; $other:ident = $($rest:tt)*) => {
        ::core::compile_error!(::core::concat!(
            "unknown key `",
            ::core::stringify!($other),
            "` in #[csv(...)]; expected `name` or `default`"
        ))
    };
}
