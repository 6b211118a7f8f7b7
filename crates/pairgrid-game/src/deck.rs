//! Card deck builder: two cards per image, uniformly shuffled.

use pairgrid_protocol::{Card, CardId};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::GameError;

/// Builds a shuffled deck of `2 × image_refs.len()` cards, two per image.
///
/// Card ids are assigned densely (`0..2N-1`) before the shuffle, so an id
/// says nothing about a card's board position. The shuffle is
/// Fisher–Yates via [`SliceRandom::shuffle`] — uniform over all
/// permutations, unlike sorting by a random tag. The RNG is injected so
/// tests can pass a seeded [`rand::rngs::StdRng`].
///
/// # Errors
/// Returns [`GameError::InvalidInput`] when fewer than 2 images are
/// supplied.
pub fn build_deck<R: Rng + ?Sized>(
    image_refs: &[String],
    rng: &mut R,
) -> Result<Vec<Card>, GameError> {
    if image_refs.len() < 2 {
        return Err(GameError::InvalidInput(format!(
            "a deck needs at least 2 images, got {}",
            image_refs.len()
        )));
    }

    let mut cards = Vec::with_capacity(image_refs.len() * 2);
    let mut next_id = 0u32;
    for image_ref in image_refs {
        for _ in 0..2 {
            cards.push(Card {
                id: CardId(next_id),
                image_ref: image_ref.clone(),
                flipped: false,
                matched: false,
            });
            next_id += 1;
        }
    }

    cards.shuffle(rng);
    Ok(cards)
}
