// SPDX-License-Identifier: MIT

/// Generates the `From` conversions between the error layers.
///
/// - `top`: every layer error converts into its variant of the top-level error.
/// - `str_into`: `&'static str` converts into `Other` of each listed layer and of the top.
/// - `sub`: a lower layer error converts into a variant of a higher layer.
#[macro_export]
macro_rules! fs_error_wiring {
    (
        top => $top:ty {
            $($top_src:ty : $top_variant:ident),+ $(,)?
        },
        str_into => [ $($str_tgt:ty),* $(,)? ],
        sub => {
            $($src_sub:ty => [ $($dst_sub:ident::$dst_variant:ident),+ ] ),* $(,)?
        } $(,)?
    ) => {
        $(
            impl From<$top_src> for $top {
                #[inline]
                fn from(e: $top_src) -> Self { <$top>::$top_variant(e) }
            }
        )+

        $(
            impl From<&'static str> for $str_tgt {
                #[inline]
                fn from(msg: &'static str) -> Self { <$str_tgt>::Other(msg) }
            }
        )*
        impl From<&'static str> for $top {
            #[inline]
            fn from(msg: &'static str) -> Self { <$top>::Other(msg) }
        }

        $(
            $(
                impl From<$src_sub> for $dst_sub {
                    #[inline]
                    fn from(e: $src_sub) -> Self { <$dst_sub>::$dst_variant(e) }
                }
            )+
        )*
    };
}

/// `Display` for error types exposing `msg()` and `source()`: prints the
/// message followed by one `caused by:` line per link of the chain.
#[macro_export]
macro_rules! fs_error_display {
    ($($t:ty),+ $(,)?) => {
        $(
            impl ::core::fmt::Display for $t {
                fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                    write!(f, "{}", self.msg())?;
                    let mut current = self.source();
                    while let Some(src) = current {
                        write!(f, "\n  caused by: {}", src.msg())?;
                        current = src.source();
                    }
                    Ok(())
                }
            }
        )+
    };
}

/// Returns `Err($err.into())` unless `$cond` holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

/// Returns `Err($err.into())`.
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($err.into());
    };
}
