use proptest::collection::vec;
use proptest::prelude::*;

use coltok::{Tokenizer, TokenizerBuilder};

fn field() -> impl Strategy<Value = String> {
    "[a-z0-9]{0,8}"
}

fn nonempty_field() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

fn padding() -> impl Strategy<Value = String> {
    "[ \t]{0,3}"
}

/// A rectangular table at least two columns wide, so that a row of empty
/// fields still renders as a non-blank line.
fn table() -> impl Strategy<Value = Vec<Vec<String>>> {
    (2..6usize).prop_flat_map(|width| vec(vec(field(), width..=width), 1..8))
}

fn render(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn tokenize(tok: &mut Tokenizer, source: &str, num_cols: usize) {
    tok.set_num_cols(num_cols);
    let use_cols = vec![true; num_cols];
    tok.tokenize(source.as_bytes(), &use_cols, 0).unwrap();
}

fn columns(tok: &Tokenizer, num_cols: usize) -> Vec<Vec<String>> {
    (0..num_cols)
        .map(|c| {
            tok.column_fields(c)
                .map(|f| {
                    // Empty fields are canonicalized: the 0x01 marker must
                    // never escape the iterator.
                    assert_ne!(f.first(), Some(&0x01));
                    String::from_utf8(f.to_vec()).unwrap()
                })
                .collect()
        })
        .collect()
}

fn transpose(rows: &[Vec<String>], width: usize) -> Vec<Vec<String>> {
    (0..width)
        .map(|c| rows.iter().map(|row| row[c].clone()).collect())
        .collect()
}

proptest! {
    // Tokenizing ASCII fields joined by the delimiter gives back exactly
    // the field sequence, column by column, and every column holds one
    // field per completed row.
    #[test]
    fn ascii_round_trip(rows in table()) {
        let width = rows[0].len();
        let source = render(&rows);
        let mut tok = Tokenizer::new();
        tokenize(&mut tok, &source, width);

        prop_assert_eq!(tok.num_rows(), rows.len());
        let cols = columns(&tok, width);
        prop_assert_eq!(cols, transpose(&rows, width));
    }

    // With filling enabled, ragged rows still leave every column with
    // exactly one field per row; the padded fields are empty.
    #[test]
    fn fill_conserves_field_counts(
        (width, rows) in (2..6usize).prop_flat_map(|width| {
            let row = (1..=width).prop_flat_map(move |len| {
                vec(nonempty_field(), len..=len)
            });
            (Just(width), vec(row, 1..8))
        }),
    ) {
        let source = render(&rows);
        let mut tok = TokenizerBuilder::new().fill_extra_cols(true).build();
        tokenize(&mut tok, &source, width);

        prop_assert_eq!(tok.num_rows(), rows.len());
        let cols = columns(&tok, width);
        for (c, col) in cols.iter().enumerate() {
            prop_assert_eq!(col.len(), rows.len(), "column {}", c);
        }
        for (r, row) in rows.iter().enumerate() {
            for c in 0..width {
                let expected = row.get(c).cloned().unwrap_or_default();
                prop_assert_eq!(&cols[c][r], &expected);
            }
        }
    }

    // Padding any field with extra spaces and tabs outside of quotes does
    // not change the emitted payloads while both strip policies are on.
    #[test]
    fn whitespace_strip_idempotence(
        rows in (2..6usize).prop_flat_map(|width| {
            vec(vec((padding(), field(), padding()), width..=width), 1..8)
        }),
    ) {
        let width = rows[0].len();
        let padded: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(l, f, r)| format!("{}{}{}", l, f, r))
                    .collect()
            })
            .collect();
        let plain: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|(_, f, _)| f.clone()).collect())
            .collect();

        let mut tok = Tokenizer::new();
        tokenize(&mut tok, &render(&padded), width);
        let got = columns(&tok, width);
        prop_assert_eq!(got, transpose(&plain, width));
    }

    // Excluding column k yields the same output as physically removing
    // column k from the input. Width three and up, so the reduced table
    // still renders every row as a non-blank line.
    #[test]
    fn exclusion_equivalence(
        (rows, excluded) in (3..6usize)
            .prop_flat_map(|width| (vec(vec(field(), width..=width), 1..8), 0..width)),
    ) {
        let width = rows[0].len();
        let mut use_cols = vec![true; width];
        use_cols[excluded] = false;

        let mut tok = Tokenizer::new();
        tok.set_num_cols(width - 1);
        tok.tokenize(render(&rows).as_bytes(), &use_cols, 0).unwrap();
        let with_flags = columns(&tok, width - 1);

        let removed: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|&(c, _)| c != excluded)
                    .map(|(_, f)| f.clone())
                    .collect()
            })
            .collect();
        let mut tok = Tokenizer::new();
        tokenize(&mut tok, &render(&removed), width - 1);
        let physically_removed = columns(&tok, width - 1);

        prop_assert_eq!(with_flags, physically_removed);
    }

    // The payload between matched quotes passes through byte for byte,
    // delimiters included, under either whitespace policy.
    #[test]
    fn quote_transparency(
        payload in "[a-z0-9,;#]{1,12}",
        strip in any::<bool>(),
    ) {
        let source = format!("\"{}\",x\n", payload);
        let mut tok = TokenizerBuilder::new()
            .comment(Some('#'))
            .strip_whitespace_lines(strip)
            .strip_whitespace_fields(strip)
            .build();
        tokenize(&mut tok, &source, 2);

        let got: Vec<Vec<u8>> = tok.column_fields(0).map(|f| f.to_vec()).collect();
        prop_assert_eq!(got, vec![payload.into_bytes()]);
    }
}
