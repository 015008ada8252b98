/// Preamble scanning and frame alignment.
///
/// Provides [`Preamble`](locate::Preamble) for finding the SMPTE-337-style
/// burst preamble and loading the framed payload at the discovered word
/// size.
pub mod locate;

/// Parser-wide state: failure level and description text collection.
pub mod parse;

/// Frame sequencing: counting, seeking and ordered delivery.
pub mod sequence;
