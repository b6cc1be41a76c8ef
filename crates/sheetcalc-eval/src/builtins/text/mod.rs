mod extended;
mod len_left_right;
mod mid_sub_replace;
mod trim_case_concat;
mod value_text;

use crate::function::Builtin;
use crate::function_registry::FunctionRegistryBuilder;

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register_all(&[
        Builtin::new("LEN", len_left_right::len).args(1),
        Builtin::new("LEFT", len_left_right::left).range(1, 2),
        Builtin::new("RIGHT", len_left_right::right).range(1, 2),
        Builtin::new("MID", mid_sub_replace::mid).args(3),
        Builtin::new("FIND", mid_sub_replace::find).range(2, 3),
        Builtin::new("SEARCH", mid_sub_replace::search).range(2, 3),
        Builtin::new("SUBSTITUTE", mid_sub_replace::substitute).range(3, 4),
        Builtin::new("REPLACE", mid_sub_replace::replace).args(4),
        Builtin::new("UPPER", trim_case_concat::upper).args(1),
        Builtin::new("LOWER", trim_case_concat::lower).args(1),
        Builtin::new("PROPER", trim_case_concat::proper).args(1),
        Builtin::new("TRIM", trim_case_concat::trim).args(1),
        Builtin::new("CONCATENATE", trim_case_concat::concatenate).min(1),
        Builtin::new("CONCAT", trim_case_concat::concat).min(1),
        Builtin::new("TEXTJOIN", trim_case_concat::textjoin).min(3),
        Builtin::new("REPT", trim_case_concat::rept).args(2),
        Builtin::new("EXACT", trim_case_concat::exact).args(2),
        Builtin::new("VALUE", value_text::value).args(1),
        Builtin::new("TEXT", value_text::text_fn).args(2),
        Builtin::new("CHAR", value_text::char_fn).args(1),
        Builtin::new("CODE", value_text::code).args(1),
        Builtin::new("SPLIT", extended::split).range(2, 4),
    ]);
}
