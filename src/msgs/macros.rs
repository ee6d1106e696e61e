/* Convenience macro for the codec: early-return None on parse failure. */
macro_rules! try_ret(
  ($e:expr) => (
    match $e {
      Some(x) => x,
      None => return None
    }
  )
);

/* A macro which defines an enum type backed by u8 or u16, with
 * a Codec implementation and conversion to the underlying value.
 * Unknown values survive decode/encode round trips. */
macro_rules! enum_builder {
  (
  $(#[$comment:meta])*
  @U8
    EnumName: $enum_name: ident;
    EnumVal { $( $enum_var: ident => $enum_val: expr ),* }
  ) => {
    $(#[$comment])*
    #[derive(Debug, PartialEq, Clone, Copy)]
    pub enum $enum_name {
      $( $enum_var),*
      ,Unknown(u8)
    }

    impl $enum_name {
      pub fn get_u8(&self) -> u8 {
        match *self {
          $( $enum_name::$enum_var => $enum_val),*
          ,$enum_name::Unknown(x) => x
        }
      }
    }

    impl Codec for $enum_name {
      fn encode(&self, bytes: &mut Vec<u8>) {
        codec::encode_u8(self.get_u8(), bytes);
      }

      fn read(r: &mut Reader) -> Option<$enum_name> {
        let u = try_ret!(codec::read_u8(r));

        $(
          if u == $enum_val {
            return Some($enum_name::$enum_var);
          }
        )*

        Some($enum_name::Unknown(u))
      }
    }
  };
  (
  $(#[$comment:meta])*
  @U16
    EnumName: $enum_name: ident;
    EnumVal { $( $enum_var: ident => $enum_val: expr ),* }
  ) => {
    $(#[$comment])*
    #[derive(Debug, PartialEq, Clone, Copy)]
    pub enum $enum_name {
      $( $enum_var),*
      ,Unknown(u16)
    }

    impl $enum_name {
      pub fn get_u16(&self) -> u16 {
        match *self {
          $( $enum_name::$enum_var => $enum_val),*
          ,$enum_name::Unknown(x) => x
        }
      }
    }

    impl Codec for $enum_name {
      fn encode(&self, bytes: &mut Vec<u8>) {
        codec::encode_u16(self.get_u16(), bytes);
      }

      fn read(r: &mut Reader) -> Option<$enum_name> {
        let u = try_ret!(codec::read_u16(r));

        $(
          if u == $enum_val {
            return Some($enum_name::$enum_var);
          }
        )*

        Some($enum_name::Unknown(u))
      }
    }
  };
}
