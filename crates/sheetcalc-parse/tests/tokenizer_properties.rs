use proptest::prelude::*;
use sheetcalc_parse::{TokenKind, tokenize};

proptest! {
    #[test]
    fn numeric_literal_is_one_token(
        int in "[0-9]{1,12}",
        frac in proptest::option::of("[0-9]{1,8}"),
        exp in proptest::option::of(("[eE]", "[+-]?", "[0-9]{1,3}")),
    ) {
        let mut literal = int;
        if let Some(f) = frac {
            literal.push('.');
            literal.push_str(&f);
        }
        if let Some((e, sign, digits)) = exp {
            literal.push_str(&e);
            literal.push_str(&sign);
            literal.push_str(&digits);
        }

        let tokens = tokenize(&literal).unwrap();
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(tokens[0].kind, TokenKind::Number);
        prop_assert_eq!(&tokens[0].text, &literal);
        prop_assert_eq!((tokens[0].start, tokens[0].end), (0, literal.len()));
        prop_assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn cell_references_survive_surrounding_whitespace(
        col in 0u32..18_278,
        row in 1u32..1_048_577,
        pad in " {0,3}",
    ) {
        let text = format!(
            "{pad}{}{row}{pad}",
            sheetcalc_common::reference::index_to_column(col)
        );
        let tokens = tokenize(&text).unwrap();
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(tokens[0].kind, TokenKind::CellRef);
    }

    #[test]
    fn tokenizer_never_panics(text in "\\PC{0,40}") {
        let _ = tokenize(&text);
    }
}
