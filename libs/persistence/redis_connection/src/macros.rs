/// Declares a cache key family.
///
/// ```ignore
/// cache_key!(BlogCacheKey::<Blog> => "blog:{}"[id: Uuid]);
/// cache_key!(BlogListDefaultKey => "blogs::");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($name:ident::<$t:ty> => $format_key:literal[$($arg:ident:$ty:ident),*]) => {
        $crate::cache_key!($name => $format_key[$($arg: $ty),*]);

        impl $crate::core::key::CacheKeyValue for $name {
            type Value = $t;
        }
    };
    ($name:ident::<$t:ty> => $key:literal) => {
        $crate::cache_key!($name => $key);

        impl $crate::core::key::CacheKeyValue for $name {
            type Value = $t;
        }
    };
    ($name:ident => $format_key:literal[$($arg:ident:$ty:ident),*]) => {
        #[doc=concat!("Cache key family\n ## Key \n", $format_key)]
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $crate::core::key::CacheKey for $name {
            type Args<'r> = ($(&'r $ty,)*);

            fn get_key_with_args(&self, args: Self::Args<'_>) -> std::borrow::Cow<'static, str> {
                let ($($arg,)*) = args;

                (format!($format_key, $($arg),*)).into()
            }
        }
    };
    ($name:ident => $key:literal) => {
        #[doc=concat!("Cache key\n ## Key \n", $key)]
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $crate::core::key::CacheKey for $name {
            type Args<'r> = ();

            fn get_key_with_args(&self, _: Self::Args<'_>) -> std::borrow::Cow<'static, str> {
                ($key).into()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::key::{CacheKey, CacheKeyValue};

    crate::cache_key!(PostKey => "post:{}"[id: u64]);
    crate::cache_key!(PostListKey => "posts:{}:{}"[search: str, tag: str]);
    crate::cache_key!(AllPostsKey::<Vec<String>> => "posts::");

    #[test]
    fn test_single_argument_key() {
        assert_eq!(PostKey.get_key_with(&42), "post:42");
    }

    #[test]
    fn test_multi_argument_key() {
        assert_eq!(PostListKey.get_key_with_args(("", "")), "posts::");
        assert_eq!(
            PostListKey.get_key_with_args(("rust", "Tech")),
            "posts:rust:Tech"
        );
    }

    #[test]
    fn test_constant_key() {
        assert_eq!(AllPostsKey.get_key(), "posts::");
    }

    #[test]
    fn test_typed_key_value() {
        fn value_of<K: CacheKeyValue>(_: &K) -> &'static str {
            std::any::type_name::<K::Value>()
        }

        assert_eq!(value_of(&AllPostsKey), std::any::type_name::<Vec<String>>());
    }
}
