//! Built-in practice motions.

use rand::Rng;
use rand::seq::SliceRandom;

pub const DEFAULT_MOTIONS: [&str; 20] = [
    "This House Would ban TikTok",
    "This House Believes that AI will replace teachers",
    "This House Would remove zoos",
    "This House Believes money spent on space exploration is a waste",
    "This House Would ban private cars in cities",
    "This House Believes exams do more harm than good",
    "This House Would make voting compulsory",
    "This House Believes that influencers are bad role models",
    "This House Would legalise all drugs",
    "This House Believes that patriotism is dangerous",
    "This House Would tax the rich heavily to fund basic income",
    "This House Believes that animals have equal rights",
    "This House Would abolish homework",
    "This House Believes social media does more harm than good",
    "This House Would ban animal testing",
    "This House Believes nuclear energy is the future",
    "This House Would replace politicians with experts",
    "This House Believes tradition holds back progress",
    "This House Would limit AI research",
    "This House Believes success is luck, not hard work",
];

/// Pick one of the built-in motions.
pub fn random_motion<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    // The list is a non-empty constant, so `choose` always yields a value.
    DEFAULT_MOTIONS
        .choose(rng)
        .copied()
        .unwrap_or(DEFAULT_MOTIONS[0])
}
