// src/common/random.rs

use rand::{rngs::OsRng, RngCore};

use crate::common::error::AppError;

/// Fonte de bytes aleatórios usada para gerar tokens.
/// Injetada no `AuthService` para que os testes possam simular falhas.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), rand::Error>;
}

/// Gerador criptograficamente seguro do sistema operacional.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), rand::Error> {
        OsRng.try_fill_bytes(buf)
    }
}

/// Quantidade de bytes aleatórios por token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Gera um token opaco em hex. Falha fechada: se a fonte não entregar
/// todos os bytes, nenhum token é emitido.
pub fn generate_token(source: &dyn RandomSource) -> Result<String, AppError> {
    let mut buffer = [0u8; TOKEN_BYTES];
    source.fill(&mut buffer)?;
    Ok(hex::encode(buffer))
}

/// Um token bem formado tem exatamente `2 * TOKEN_BYTES` dígitos hex minúsculos,
/// como `hex::encode` produz.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2
        && token.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::num::NonZeroU32;

    /// Fonte que sempre falha, como um /dev/urandom indisponível.
    pub struct BrokenRandom;

    impl RandomSource for BrokenRandom {
        fn fill(&self, _buf: &mut [u8]) -> Result<(), rand::Error> {
            let code = NonZeroU32::new(rand::Error::CUSTOM_START).unwrap();
            Err(rand::Error::from(code))
        }
    }
}
