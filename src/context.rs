/// Appended after every chunk in the assembled context
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Default cap on the assembled context, in characters
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 4000;

/// Concatenate retrieved chunk texts, nearest first, into one context block.
///
/// Each chunk is followed by [`CHUNK_SEPARATOR`]. With `max_chars > 0`,
/// assembly stops at the first chunk that would push the context past the cap.
/// The nearest chunk is always included; if it alone is over the cap it is cut
/// to `max_chars` characters. `max_chars == 0` disables the cap.
pub fn assemble_context<'a, I>(texts: I, max_chars: usize) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut context = String::new();
    let mut used_chars = 0;
    let separator_chars = CHUNK_SEPARATOR.chars().count();

    for (rank, text) in texts.into_iter().enumerate() {
        let needed = text.chars().count() + separator_chars;

        if max_chars > 0 && used_chars + needed > max_chars {
            if rank == 0 {
                context.extend(text.chars().take(max_chars));
            }
            break;
        }

        context.push_str(text);
        context.push_str(CHUNK_SEPARATOR);
        used_chars += needed;
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncapped_context_keeps_order() {
        let context = assemble_context(["nearest", "second", "third"], 0);
        assert_eq!(context, "nearest\n\nsecond\n\nthird\n\n");
    }

    #[test]
    fn test_cap_drops_trailing_chunks() {
        // "aaaa\n\n" = 6 chars, "bbbb\n\n" would reach 12
        let context = assemble_context(["aaaa", "bbbb", "cc"], 11);
        assert_eq!(context, "aaaa\n\n");
    }

    #[test]
    fn test_cap_stops_at_first_chunk_that_does_not_fit() {
        // a smaller later chunk is not pulled ahead of a larger earlier one
        let context = assemble_context(["aa", "bbbbbbbbbb", "c"], 8);
        assert_eq!(context, "aa\n\n");
    }

    #[test]
    fn test_oversized_nearest_chunk_is_truncated() {
        let context = assemble_context(["abcdefghij", "k"], 4);
        assert_eq!(context, "abcd");
    }

    #[test]
    fn test_exact_fit() {
        let context = assemble_context(["ab", "cd"], 8);
        assert_eq!(context, "ab\n\ncd\n\n");
    }

    #[test]
    fn test_no_chunks() {
        assert_eq!(assemble_context(Vec::<&str>::new(), 100), "");
    }
}
