use std::borrow::Cow;

/// A family of cache keys sharing one format, e.g. `blog:{}`.
pub trait CacheKey {
    type Args<'r>;

    fn get_key_with_args(&self, arg: Self::Args<'_>) -> Cow<'static, str>;

    fn get_key(&self) -> Cow<'static, str>
    where
        for<'r> Self::Args<'r>: CacheKeyAutoConstruct,
    {
        CacheKey::get_key_with_args(self, CacheKeyAutoConstruct::construct())
    }

    fn get_key_with<'a>(
        &self, arg: <Self::Args<'a> as CacheKeyArg1>::Arg0,
    ) -> Cow<'static, str>
    where
        Self::Args<'a>: CacheKeyArg1,
    {
        CacheKey::get_key_with_args(
            self,
            <Self::Args<'a> as CacheKeyArg1>::construct(arg),
        )
    }
}

pub trait CacheKeyArg1 {
    type Arg0;

    fn construct(arg0: Self::Arg0) -> Self;
}

impl<T> CacheKeyArg1 for (T,) {
    type Arg0 = T;

    fn construct(arg0: Self::Arg0) -> Self { (arg0,) }
}

pub trait CacheKeyAutoConstruct {
    fn construct() -> Self;
}

impl CacheKeyAutoConstruct for () {
    fn construct() -> Self {}
}

/// Binds a key family to the type cached under it
pub trait CacheKeyValue: CacheKey {
    type Value: serde::Serialize + serde::de::DeserializeOwned + Send + Sync;
}
