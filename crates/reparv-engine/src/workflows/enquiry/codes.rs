use rand::Rng;

use super::repository::{EnquiryRepository, RepositoryError};

// No ambiguous 0/O/1/I so the code survives being read over the phone.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 8;
const MAX_ATTEMPTS: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CodeError {
    #[error("could not reserve a unique reference code after {attempts} attempts")]
    Exhausted { attempts: usize },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Generate a customer-facing reference code, retrying on collision. The
/// repository's reservation is the correctness backstop; the loop only
/// bounds how long we keep asking.
pub fn generate_reference_code<R>(repository: &R) -> Result<String, CodeError>
where
    R: EnquiryRepository + ?Sized,
{
    let mut rng = rand::thread_rng();
    for _ in 0..MAX_ATTEMPTS {
        let code: String = (0..CODE_LENGTH)
            .map(|_| {
                let idx = rng.gen_range(0..CODE_ALPHABET.len());
                CODE_ALPHABET[idx] as char
            })
            .collect();
        if repository.reserve_code(&code)? {
            return Ok(code);
        }
    }
    Err(CodeError::Exhausted {
        attempts: MAX_ATTEMPTS,
    })
}
