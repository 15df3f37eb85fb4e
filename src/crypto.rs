mod errors;

pub use errors::Error;

use errors::CryptoResult;
use openssl::hash::{Hasher, MessageDigest as Digest};

/// Hash algorithms used by the WS-Security tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    /// SHA-1, required by the UsernameToken password digest
    Sha1,
}

impl HashAlg {
    /// Hash the concatenation of all given chunks
    pub fn hash_all<I, D>(&self, chunks: I) -> CryptoResult<Vec<u8>>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        let mut hasher = Hasher::new(self.into())?;
        for chunk in chunks {
            hasher.update(chunk.as_ref())?;
        }
        Ok(hasher.finish()?.to_vec())
    }
}

impl From<&HashAlg> for Digest {
    fn from(hash_alg: &HashAlg) -> Self {
        match hash_alg {
            HashAlg::Sha1 => Digest::sha1(),
        }
    }
}

/// Fill a buffer of `len` bytes from the OpenSSL CSPRNG
pub fn random_bytes(len: usize) -> CryptoResult<Vec<u8>> {
    if len == 0 {
        return Err(Error::Invalid("requested zero random bytes".into()));
    }
    let mut buf = vec![0u8; len];
    openssl::rand::rand_bytes(&mut buf)?;
    Ok(buf)
}
