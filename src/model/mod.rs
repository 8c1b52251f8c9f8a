/// Maps a strum-backed enum onto a MySQL string column.
///
/// Values are read through `EnumString` and written through `AsRefStr`, so
/// the column always holds the SCREAMING_SNAKE_CASE name. Bind the enum
/// itself, never a `&str` borrowed from a temporary.
macro_rules! mysql_string_enum {
    ($name:ty) => {
        impl sqlx::Type<sqlx::mysql::MySql> for $name {
            fn type_info() -> sqlx::mysql::MySqlTypeInfo {
                <str as sqlx::Type<sqlx::mysql::MySql>>::type_info()
            }

            fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
                <str as sqlx::Type<sqlx::mysql::MySql>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::mysql::MySql> for $name {
            fn decode(
                value: sqlx::mysql::MySqlValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as sqlx::Decode<'r, sqlx::mysql::MySql>>::decode(value)?;
                raw.parse::<$name>().map_err(Into::into)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::mysql::MySql> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::mysql::MySql as sqlx::database::HasArguments<'q>>::ArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                let raw: &str = AsRef::<str>::as_ref(self);
                <&str as sqlx::Encode<'q, sqlx::mysql::MySql>>::encode_by_ref(&raw, buf)
            }
        }
    };
}

pub(crate) use mysql_string_enum;

pub mod approval_level;
pub mod approval_request;
pub mod attendance;
pub mod employee;
pub mod holiday;
pub mod time_policy;
pub mod user;
