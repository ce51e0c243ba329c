//! Domain model for journal entries, zodiac signs and horoscopes.
//!
//! # Responsibility
//! - Define the value types shared by store, storage and services.
//! - Validate strings where they become typed values (sign, entry key).
//!
//! # Invariants
//! - A selected sign is always one of the twelve `ZodiacSign` values.
//! - Journal entries are identified by `EntryKey`, never by raw strings.

pub mod horoscope;
pub mod journal;
pub mod zodiac;
