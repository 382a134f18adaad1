//! Shared char-sequence generation.
//!
//! The sequence is generated once per round, server-side, and handed to
//! every player verbatim — identical content in identical order is the
//! race's fairness guarantee. Sampling is uniform over the configured
//! character set; row/hand restrictions are client display preferences
//! and never affect generation here.

use keyrace_protocol::{CaseMode, GameConfig, GameMode};
use rand::Rng;

const ENGLISH_LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const ENGLISH_UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Zhuyin (bopomofo) symbols: 21 initials, 3 medials, 13 finals.
const ZHUYIN_CHARS: &str =
    "ㄅㄆㄇㄈㄉㄊㄋㄌㄍㄎㄏㄐㄑㄒㄓㄔㄕㄖㄗㄘㄙㄧㄨㄩㄚㄛㄜㄝㄞㄟㄠㄡㄢㄣㄤㄥㄦ";

/// Assumed upper bound on sustained typing speed, in keystrokes per
/// second. Sizing the sequence at `duration * 3` guarantees no player
/// can exhaust it before the duration timer fires.
const KEYSTROKES_PER_SECOND: u64 = 3;

/// Returns how many characters a round of `duration_secs` needs.
pub fn sequence_len(duration_secs: u64) -> usize {
    (duration_secs * KEYSTROKES_PER_SECOND) as usize
}

/// Generates `count` characters drawn uniformly from the set the
/// config selects.
pub fn generate_sequence(config: &GameConfig, count: usize) -> Vec<char> {
    let pool: Vec<char> = match config.mode {
        GameMode::English => match config.case_mode {
            CaseMode::Lowercase => ENGLISH_LOWERCASE.chars().collect(),
            CaseMode::Uppercase => ENGLISH_UPPERCASE.chars().collect(),
            CaseMode::Mixed => ENGLISH_LOWERCASE
                .chars()
                .chain(ENGLISH_UPPERCASE.chars())
                .collect(),
        },
        GameMode::Zhuyin => ZHUYIN_CHARS.chars().collect(),
    };

    let mut rng = rand::rng();
    (0..count)
        .map(|_| pool[rng.random_range(0..pool.len())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: GameMode, case_mode: CaseMode) -> GameConfig {
        GameConfig {
            mode,
            duration: 60,
            case_mode,
            active_rows: None,
            hand_mode: None,
        }
    }

    #[test]
    fn test_sequence_len_is_three_per_second() {
        assert_eq!(sequence_len(60), 180);
        assert_eq!(sequence_len(30), 90);
        assert_eq!(sequence_len(0), 0);
    }

    #[test]
    fn test_generate_sequence_has_requested_length() {
        let seq = generate_sequence(
            &config(GameMode::English, CaseMode::Lowercase),
            180,
        );
        assert_eq!(seq.len(), 180);
    }

    #[test]
    fn test_lowercase_mode_only_emits_lowercase_ascii() {
        let seq = generate_sequence(
            &config(GameMode::English, CaseMode::Lowercase),
            500,
        );
        assert!(seq.iter().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_uppercase_mode_only_emits_uppercase_ascii() {
        let seq = generate_sequence(
            &config(GameMode::English, CaseMode::Uppercase),
            500,
        );
        assert!(seq.iter().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_mixed_mode_emits_both_cases() {
        // 500 uniform draws from 52 letters make an all-one-case result
        // astronomically unlikely.
        let seq =
            generate_sequence(&config(GameMode::English, CaseMode::Mixed), 500);
        assert!(seq.iter().any(|c| c.is_ascii_lowercase()));
        assert!(seq.iter().any(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_zhuyin_mode_only_emits_zhuyin_symbols() {
        let seq = generate_sequence(
            &config(GameMode::Zhuyin, CaseMode::Lowercase),
            200,
        );
        assert!(seq.iter().all(|c| ZHUYIN_CHARS.contains(*c)));
    }
}
