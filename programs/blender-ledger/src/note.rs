//! Note codec.
//!
//! A note is the secret a depositor keeps to later spend their position. It
//! travels as a string:
//!
//! ```text
//! blender-0x<assetAddress: 40 hex>-<assetId: decimal>-<networkId: decimal>-0x<payload: 248 hex>
//! ```
//!
//! The payload is four 31-byte big-endian integers, in this order:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 31 | nullifier |
//! | 31 | 31 | assetAddress |
//! | 62 | 31 | assetId |
//! | 93 | 31 | secret |
//!
//! The metadata before the payload is redundant with it and must agree.

use core::{fmt, str::FromStr};

use blender_custody_interface::{Address, AssetRef};
use blender_network_ids::PROTOCOL_TAG;
use rand::{CryptoRng, RngCore};

use crate::{
    errors::{LedgerError, LedgerResult},
    field::FieldElement,
    hasher::{Poseidon, note_commitment, nullifier_hash},
};

/// Width of one encoded note element.
pub const NOTE_ELEMENT_BYTES: usize = 31;

/// Width of the encoded note payload.
pub const NOTE_PAYLOAD_BYTES: usize = 4 * NOTE_ELEMENT_BYTES;

/// Secret note material for one custodied unit.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Spend-authorization secret, disclosed only as its hash
    pub nullifier: FieldElement,
    /// Blinding secret, never disclosed
    pub secret: FieldElement,
    /// Asset contract address as a field element
    pub asset_address: FieldElement,
    /// Token id as a field element
    pub asset_id: FieldElement,
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("asset_address", &self.asset_address)
            .field("asset_id", &self.asset_id)
            .finish_non_exhaustive()
    }
}

impl Note {
    /// Build a note for `asset` from explicit secrets.
    pub fn new(nullifier: FieldElement, secret: FieldElement, asset: &AssetRef) -> Self {
        Self {
            nullifier,
            secret,
            asset_address: FieldElement::from_address(&asset.address),
            asset_id: FieldElement(asset.id),
        }
    }

    /// Draw fresh nullifier and secret for `asset` from a cryptographic RNG.
    ///
    /// Both secrets are 31 random bytes, so they are always below `2^248`
    /// and therefore canonical and encodable.
    ///
    /// # Errors
    /// Returns `AssetIdOutOfRange` if the asset id needs more than 31 bytes.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, asset: &AssetRef) -> LedgerResult<Self> {
        let asset_id = FieldElement(asset.id);
        if !asset_id.fits_in_bytes(NOTE_ELEMENT_BYTES) {
            return Err(LedgerError::AssetIdOutOfRange);
        }
        Ok(Self::new(random_element(rng), random_element(rng), asset))
    }

    /// The asset this note stands for.
    ///
    /// # Errors
    /// Returns `InvalidNoteFormat` if the address is wider than 20 bytes.
    pub fn asset(&self) -> LedgerResult<AssetRef> {
        let address = self
            .asset_address
            .to_address()
            .ok_or(LedgerError::InvalidNoteFormat)?;
        Ok(AssetRef::new(address, self.asset_id.0))
    }

    /// `H(nullifier, assetAddress, assetId, secret)`.
    ///
    /// # Errors
    /// Returns `HashFailure` if any element is not canonical.
    pub fn commitment(&self) -> LedgerResult<FieldElement> {
        note_commitment::<Poseidon>(
            &self.nullifier,
            &self.asset_address,
            &self.asset_id,
            &self.secret,
        )
    }

    /// `H(nullifier, assetAddress, assetId)`.
    ///
    /// # Errors
    /// Returns `HashFailure` if any element is not canonical.
    pub fn nullifier_hash(&self) -> LedgerResult<FieldElement> {
        nullifier_hash::<Poseidon>(&self.nullifier, &self.asset_address, &self.asset_id)
    }

    /// Encode into the 124-byte payload.
    ///
    /// # Errors
    /// Returns `InvalidNoteFormat` if any element is `>= 2^248`.
    pub fn encode(&self) -> LedgerResult<[u8; NOTE_PAYLOAD_BYTES]> {
        let mut out = [0u8; NOTE_PAYLOAD_BYTES];
        let elements = [
            &self.nullifier,
            &self.asset_address,
            &self.asset_id,
            &self.secret,
        ];
        for (chunk, element) in out.chunks_exact_mut(NOTE_ELEMENT_BYTES).zip(elements) {
            if !element.fits_in_bytes(NOTE_ELEMENT_BYTES) {
                return Err(LedgerError::InvalidNoteFormat);
            }
            chunk.copy_from_slice(&element.0[32 - NOTE_ELEMENT_BYTES..]);
        }
        Ok(out)
    }

    /// Decode a 124-byte payload.
    ///
    /// # Errors
    /// Returns `InvalidNoteFormat` if the length is wrong.
    pub fn decode(bytes: &[u8]) -> LedgerResult<Self> {
        if bytes.len() != NOTE_PAYLOAD_BYTES {
            return Err(LedgerError::InvalidNoteFormat);
        }
        let mut elements = bytes.chunks_exact(NOTE_ELEMENT_BYTES).map(|chunk| {
            let mut fe = [0u8; 32];
            fe[32 - NOTE_ELEMENT_BYTES..].copy_from_slice(chunk);
            FieldElement(fe)
        });
        let mut next = || elements.next().ok_or(LedgerError::InvalidNoteFormat);
        Ok(Self {
            nullifier: next()?,
            asset_address: next()?,
            asset_id: next()?,
            secret: next()?,
        })
    }
}

fn random_element<R: RngCore + CryptoRng>(rng: &mut R) -> FieldElement {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes[32 - NOTE_ELEMENT_BYTES..]);
    FieldElement(bytes)
}

/// A note together with the network it was minted for, in string form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteString {
    /// The decoded note
    pub note: Note,
    /// Network identifier from the string metadata
    pub network_id: u64,
}

impl NoteString {
    /// Pair a note with a network.
    pub fn new(note: Note, network_id: u64) -> Self {
        Self { note, network_id }
    }

    /// Parse a note string and require it to belong to `network_id`.
    ///
    /// # Errors
    /// Returns `InvalidNoteFormat` on any syntax error, metadata mismatch or
    /// foreign network.
    pub fn parse_for_network(s: &str, network_id: u64) -> LedgerResult<Note> {
        let parsed: Self = s.parse()?;
        if parsed.network_id != network_id {
            return Err(LedgerError::InvalidNoteFormat);
        }
        Ok(parsed.note)
    }

    /// Render the note string.
    ///
    /// # Errors
    /// Returns `InvalidNoteFormat` if the note cannot be encoded.
    pub fn render(&self) -> LedgerResult<String> {
        let payload = self.note.encode()?;
        let address = self
            .note
            .asset_address
            .to_address()
            .ok_or(LedgerError::InvalidNoteFormat)?;
        Ok(format!(
            "{}-0x{}-{}-{}-0x{}",
            PROTOCOL_TAG,
            hex::encode(address),
            self.note.asset_id.to_decimal_string(),
            self.network_id,
            hex::encode(payload)
        ))
    }
}

impl fmt::Display for NoteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.render().map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl FromStr for NoteString {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        let [tag, address, asset_id, network_id, payload] = parts.as_slice() else {
            return Err(LedgerError::InvalidNoteFormat);
        };
        if *tag != PROTOCOL_TAG {
            return Err(LedgerError::InvalidNoteFormat);
        }

        let address = parse_address(address)?;
        let asset_id =
            FieldElement::from_decimal_str(asset_id).ok_or(LedgerError::InvalidNoteFormat)?;
        if network_id.is_empty() || !network_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::InvalidNoteFormat);
        }
        let network_id: u64 = network_id
            .parse()
            .map_err(|_| LedgerError::InvalidNoteFormat)?;

        let payload_hex = payload
            .strip_prefix("0x")
            .ok_or(LedgerError::InvalidNoteFormat)?;
        if payload_hex.len() != 2 * NOTE_PAYLOAD_BYTES {
            return Err(LedgerError::InvalidNoteFormat);
        }
        let mut payload = [0u8; NOTE_PAYLOAD_BYTES];
        hex::decode_to_slice(payload_hex, &mut payload)
            .map_err(|_| LedgerError::InvalidNoteFormat)?;
        let note = Note::decode(&payload)?;

        if note.asset_address != FieldElement::from_address(&address) || note.asset_id != asset_id
        {
            return Err(LedgerError::InvalidNoteFormat);
        }

        Ok(Self { note, network_id })
    }
}

fn parse_address(s: &str) -> LedgerResult<Address> {
    let hex_part = s.strip_prefix("0x").ok_or(LedgerError::InvalidNoteFormat)?;
    let mut address = [0u8; 20];
    if hex_part.len() != 40 {
        return Err(LedgerError::InvalidNoteFormat);
    }
    hex::decode_to_slice(hex_part, &mut address).map_err(|_| LedgerError::InvalidNoteFormat)?;
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use test_case::test_case;

    fn asset() -> AssetRef {
        AssetRef::from_u64_id([0x5a; 20], 1234)
    }

    fn sample_note() -> Note {
        let mut rng = StdRng::seed_from_u64(7);
        Note::generate(&mut rng, &asset()).unwrap()
    }

    /// Largest value a payload element holds: `2^248 - 1`.
    fn max_element() -> FieldElement {
        let mut bytes = [0xff; 32];
        bytes[0] = 0;
        FieldElement(bytes)
    }

    fn note_with(max_fields: [bool; 4]) -> Note {
        let pick = |max| if max { max_element() } else { FieldElement::ZERO };
        Note {
            nullifier: pick(max_fields[0]),
            secret: pick(max_fields[1]),
            asset_address: pick(max_fields[2]),
            asset_id: pick(max_fields[3]),
        }
    }

    #[test_case([false, false, false, false] ; "all zero")]
    #[test_case([true, false, false, false] ; "nullifier at max")]
    #[test_case([false, true, false, false] ; "secret at max")]
    #[test_case([false, false, true, false] ; "asset address at max")]
    #[test_case([false, false, false, true] ; "asset id at max")]
    #[test_case([true, true, true, true] ; "all at max")]
    fn test_payload_roundtrip_boundaries(max_fields: [bool; 4]) {
        let note = note_with(max_fields);
        let payload = note.encode().unwrap();
        assert_eq!(Note::decode(&payload).unwrap(), note);
    }

    #[test]
    fn test_payload_roundtrip_seeded() {
        for seed in [0u64, 1, 7, 42, 1 << 32, u64::MAX] {
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..4 {
                let note = Note::generate(&mut rng, &asset()).unwrap();
                let payload = note.encode().unwrap();
                assert_eq!(Note::decode(&payload).unwrap(), note, "seed {seed}");
            }
        }
    }

    #[test]
    fn test_payload_layout() {
        let note = Note::new(FieldElement::from_u64(1), FieldElement::from_u64(4), &asset());
        let payload = note.encode().unwrap();
        assert_eq!(payload[30], 1, "nullifier comes first");
        assert_eq!(&payload[31 + 11..62], &[0x5a; 20], "asset address second");
        assert_eq!(&payload[62 + 29..93], &1234u16.to_be_bytes(), "asset id third");
        assert_eq!(payload[123], 4, "secret last");
    }

    #[test]
    fn test_encode_rejects_wide_elements() {
        let mut note = sample_note();
        let mut wide = [0u8; 32];
        wide[0] = 1;
        note.secret = FieldElement(wide);
        assert_eq!(note.encode(), Err(LedgerError::InvalidNoteFormat));
    }

    #[test]
    fn test_generate_rejects_wide_asset_id() {
        let mut rng = StdRng::seed_from_u64(1);
        let asset = AssetRef::new([1u8; 20], [0xff; 32]);
        assert_eq!(
            Note::generate(&mut rng, &asset),
            Err(LedgerError::AssetIdOutOfRange)
        );
    }

    #[test]
    fn test_generated_secrets_differ() {
        let mut rng = StdRng::seed_from_u64(99);
        let a = Note::generate(&mut rng, &asset()).unwrap();
        let b = Note::generate(&mut rng, &asset()).unwrap();
        assert_ne!(a.nullifier, b.nullifier);
        assert_ne!(a.secret, b.secret);
        assert_ne!(a.commitment().unwrap(), b.commitment().unwrap());
    }

    #[test]
    fn test_note_string_roundtrip() {
        let note = sample_note();
        let text = NoteString::new(note, 31337).to_string();
        assert!(text.starts_with("blender-0x5a5a"));
        assert!(text.contains("-1234-31337-0x"));

        let parsed: NoteString = text.parse().unwrap();
        assert_eq!(parsed.note, note);
        assert_eq!(parsed.network_id, 31337);
        assert_eq!(NoteString::parse_for_network(&text, 31337), Ok(note));
        assert_eq!(
            NoteString::parse_for_network(&text, 1),
            Err(LedgerError::InvalidNoteFormat)
        );
    }

    #[test]
    fn test_note_string_accepts_uppercase_hex() {
        let note = sample_note();
        let text = NoteString::new(note, 1).to_string();
        let (head, payload) = text.rsplit_once("-0x").unwrap();
        let upper = format!("{}-0x{}", head, payload.to_uppercase());
        assert_eq!(upper.parse::<NoteString>().unwrap().note, note);
    }

    #[test_case("tornado-0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a-1234-1-0x00" ; "wrong tag")]
    #[test_case("blender-0x5a5a-1234-1-0x00" ; "short address")]
    #[test_case("blender-0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a-1234-1-0x00" ; "short payload")]
    #[test_case("blender-0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a-12x4-1-0x00" ; "non decimal id")]
    #[test_case("blender-0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a-1234-+1-0x00" ; "signed network")]
    #[test_case("blender" ; "missing parts")]
    fn test_malformed_note_strings(input: &str) {
        assert_eq!(
            input.parse::<NoteString>(),
            Err(LedgerError::InvalidNoteFormat)
        );
    }

    #[test]
    fn test_metadata_must_match_payload() {
        let note = sample_note();
        let text = NoteString::new(note, 1).to_string();
        let tampered = text.replacen("-1234-", "-1235-", 1);
        assert_eq!(
            tampered.parse::<NoteString>(),
            Err(LedgerError::InvalidNoteFormat)
        );
    }

    #[test]
    fn test_bad_payload_hex() {
        let note = sample_note();
        let text = NoteString::new(note, 1).to_string();
        let mut bad = text.clone();
        bad.pop();
        bad.push('g');
        assert_eq!(bad.parse::<NoteString>(), Err(LedgerError::InvalidNoteFormat));
    }

    #[test]
    fn test_decode_wrong_length() {
        assert_eq!(Note::decode(&[0u8; 123]), Err(LedgerError::InvalidNoteFormat));
        assert_eq!(Note::decode(&[0u8; 125]), Err(LedgerError::InvalidNoteFormat));
    }
}
