/// Declare a wire record: the struct, its `Record` marker and a `Wire` impl
/// driven by the per-field policy.
///
/// Policies: `id` (required identifier), `opt_id`, `opt_ids` and `opt`
/// (optional, degrades on malformed input).
macro_rules! record {
    (@get $r:ident, id, $wire:literal) => { $r.required_id($wire)? };
    (@get $r:ident, opt_id, $wire:literal) => { $r.optional_id($wire) };
    (@get $r:ident, opt_ids, $wire:literal) => { $r.optional_ids($wire) };
    (@get $r:ident, opt, $wire:literal) => { $r.optional($wire) };

    (@put $w:ident, id, $wire:literal, $v:expr) => { $w.put($wire, $v); };
    (@put $w:ident, $how:ident, $wire:literal, $v:expr) => { $w.put_opt($wire, $v); };

    (
        $(#[$meta:meta])*
        pub struct $name:ident as $entity:literal {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty = $wire:literal ($how:ident) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty ),+
        }

        impl ffbb_core::Record for $name {
            const ENTITY: &'static str = $entity;
        }

        impl ffbb_core::Wire for $name {
            const SHAPE: &'static str = $entity;

            fn from_wire(value: &serde_json::Value) -> Result<Self, ffbb_core::DecodeError> {
                let r = ffbb_core::RecordReader::new($entity, value)?;
                Ok(Self { $( $field: record!(@get r, $how, $wire) ),+ })
            }

            fn to_wire(&self) -> serde_json::Value {
                let mut w = ffbb_core::RecordWriter::new();
                $( record!(@put w, $how, $wire, &self.$field); )+
                w.finish()
            }
        }
    };
}
