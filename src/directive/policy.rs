/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Blocking policy types.
//!
//! This module defines the [`Mediums`] a directive may occupy while it is
//! being handled and the [`BlockingPolicy`] declared by handlers for each
//! directive type they register.

use bitflags::bitflags;

bitflags! {
    /// The exclusive output resources a directive occupies while in flight.
    ///
    /// Mediums model the "this directive exclusively owns this output
    /// channel while running" constraint: at most one blocking directive
    /// per medium is dispatched at any time.
    ///
    /// # Examples
    ///
    /// ```
    /// use directive_rs::directive::Mediums;
    ///
    /// let both = Mediums::AUDIO | Mediums::VISUAL;
    /// assert!(both.contains(Mediums::AUDIO));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Mediums: u8 {
        /// The audio output channel.
        const AUDIO = 0b01;

        /// The visual display channel.
        const VISUAL = 0b10;
    }
}

/// Policy attached to a `(namespace, name)` registration.
///
/// Declares which [`Mediums`] directives of that type occupy and whether
/// handling must complete before the next directive on any of those mediums
/// may start.
///
/// # Examples
///
/// ```
/// use directive_rs::directive::{BlockingPolicy, Mediums};
///
/// let policy = BlockingPolicy::AUDIO_BLOCKING;
/// assert!(policy.is_blocking());
/// assert_eq!(policy.mediums(), Mediums::AUDIO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockingPolicy {
    /// Mediums occupied while directives of this type are handled.
    mediums: Mediums,

    /// Whether handling excludes concurrent work on the occupied mediums.
    is_blocking: bool,
}

impl BlockingPolicy {
    /// Occupies the audio channel exclusively until completion.
    pub const AUDIO_BLOCKING: Self = Self::new(Mediums::AUDIO, true);

    /// Uses the audio channel without excluding successors.
    pub const AUDIO_NON_BLOCKING: Self = Self::new(Mediums::AUDIO, false);

    /// Occupies the visual channel exclusively until completion.
    pub const VISUAL_BLOCKING: Self = Self::new(Mediums::VISUAL, true);

    /// Uses the visual channel without excluding successors.
    pub const VISUAL_NON_BLOCKING: Self = Self::new(Mediums::VISUAL, false);

    /// Occupies both channels exclusively until completion.
    pub const AUDIO_VISUAL_BLOCKING: Self =
        Self::new(Mediums::AUDIO.union(Mediums::VISUAL), true);

    /// Touches no medium; always admitted immediately.
    pub const NON_BLOCKING: Self = Self::new(Mediums::empty(), false);

    /// Creates a new policy from a medium set and a blocking flag.
    #[must_use]
    pub const fn new(mediums: Mediums, is_blocking: bool) -> Self {
        Self {
            mediums,
            is_blocking,
        }
    }

    /// Returns the mediums directives of this type occupy.
    #[inline]
    #[must_use]
    pub const fn mediums(&self) -> Mediums {
        self.mediums
    }

    /// Returns `true` if handling must complete before the next directive
    /// on any of the occupied mediums may start.
    #[inline]
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        self.is_blocking
    }
}
