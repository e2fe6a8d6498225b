//! Fixed-input scenarios
//!
//! Each vector pins the byte-level behaviour a wallet depends on: the same
//! signature must always unlock the same record.

#[cfg(test)]
mod scenario_vectors {
    use crate::chunks::{decrypt_chunks, EncryptedChunk};
    use crate::discrete_log::BabyStepGiantStep;
    use crate::elgamal::{derive_keypair, encrypt_u32};
    use crate::error::{ErrorKind, Stage};
    use crate::payload::{decrypt_payload, encrypt_payload, IV_LEN};
    use crate::record::PrivateMetadataRecord;
    use crate::testing::*;

    /// Vector 1: S1 → K1, chunks(1000, 2000) → [0,0,3,232,0,0,7,208]
    #[test]
    fn test_vector_1_two_chunk_key_bytes() {
        let k1 = derive_keypair(&signature_s1()).unwrap();
        let chunks: Vec<EncryptedChunk> = [1000u32, 2000]
            .iter()
            .map(|&v| EncryptedChunk::from(encrypt_u32(k1.pubkey(), v)))
            .collect();

        let key = decrypt_chunks(&k1, &chunks, &BabyStepGiantStep::new(12)).unwrap();
        assert_eq!(key.as_bytes(), &[0, 0, 3, 232, 0, 0, 7, 208]);

        // Eight bytes is no AES key: refused, never padded
        let payload = vec![0u8; IV_LEN + 16];
        assert_eq!(
            decrypt_payload(key.as_bytes(), &payload).unwrap_err(),
            ErrorKind::InvalidKeyLength { actual: 8 }
        );
    }

    /// Vector 2: S1 is reproducible; re-deriving yields the same K1
    #[test]
    fn test_vector_2_signature_reproducibility() {
        let first = derive_keypair(&signature_s1()).unwrap();
        let second = derive_keypair(&signature_s1()).unwrap();
        assert_eq!(first.pubkey().to_bytes(), second.pubkey().to_bytes());

        // Chunks made for the first derivation open under the second
        let chunk = EncryptedChunk::from(encrypt_u32(first.pubkey(), 4000));
        let key = decrypt_chunks(&second, &[chunk], &BabyStepGiantStep::new(12)).unwrap();
        assert_eq!(key.as_bytes(), &4000u32.to_be_bytes());
    }

    /// Vector 3: zero IV, one block, "HELLO WORLD!!!!" with valid padding
    #[tokio::test]
    async fn test_vector_3_hello_world_payload() {
        let signature = signature_s1();
        let (record, payload) = fixture(&signature, &scenario_key(), SCENARIO_MESSAGE);

        assert_eq!(&payload[..IV_LEN], &[0u8; IV_LEN]);
        assert_eq!(payload.len(), IV_LEN + 16);
        assert_eq!(
            &scenario_key()[..8],
            &[0, 0, 3, 232, 0, 0, 7, 208],
            "scenario key starts with the two-chunk vector"
        );

        let plaintext = test_pipeline()
            .recover_plaintext(&record, &FixedSigner::new(signature), &MemoryFetcher::with(SCENARIO_URI, payload))
            .await
            .unwrap();
        assert_eq!(plaintext.as_bytes(), b"HELLO WORLD!!!!");
    }

    /// Vector 4: reversed chunks assemble a different key and the payload
    /// does not decrypt
    #[tokio::test]
    async fn test_vector_4_reversed_chunks() {
        let signature = signature_s1();
        let (record, payload) = fixture(&signature, &scenario_key(), SCENARIO_MESSAGE);

        let k1 = derive_keypair(&signature).unwrap();
        let search = BabyStepGiantStep::with_bound(8, 16);
        let mut reversed = record.encrypted_cipher_key.clone();
        reversed.reverse();

        let forward_key = decrypt_chunks(&k1, &record.encrypted_cipher_key, &search).unwrap();
        let reversed_key = decrypt_chunks(&k1, &reversed, &search).unwrap();
        assert_eq!(forward_key.as_bytes(), scenario_key().as_slice());
        assert_ne!(forward_key.as_bytes(), reversed_key.as_bytes());

        let reversed_record = PrivateMetadataRecord::new(SCENARIO_URI, reversed);
        let result = test_pipeline()
            .recover_plaintext(
                &reversed_record,
                &FixedSigner::new(signature),
                &MemoryFetcher::with(SCENARIO_URI, payload),
            )
            .await;

        match result {
            Err(err) => {
                assert_eq!(err.stage, Stage::PayloadDecryption);
                assert_eq!(err.kind, ErrorKind::PaddingError);
            }
            // A wrong key passes PKCS#7 about once in 256 tries; it still
            // must not reproduce the asset
            Ok(plaintext) => assert_ne!(plaintext.as_bytes(), SCENARIO_MESSAGE),
        }
    }

    /// Vector 5: AES-256 key from eight chunks
    #[test]
    fn test_vector_5_aes256_key() {
        let k1 = derive_keypair(&signature_s1()).unwrap();
        let words = [1u32, 2, 3, 4, 5, 6, 7, 8];
        let chunks: Vec<EncryptedChunk> = words
            .iter()
            .map(|&v| EncryptedChunk::from(encrypt_u32(k1.pubkey(), v)))
            .collect();

        let key = decrypt_chunks(&k1, &chunks, &BabyStepGiantStep::with_bound(8, 16)).unwrap();
        assert_eq!(key.len(), 32);

        let payload = encrypt_payload(key.as_bytes(), &[0x24; IV_LEN], b"aes-256").unwrap();
        assert_eq!(decrypt_payload(key.as_bytes(), &payload).unwrap().as_bytes(), b"aes-256");
    }
}
