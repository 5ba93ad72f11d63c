use std::borrow::Cow;

use num_bigint::BigUint;
use x509_parser::der_parser::asn1_rs::Tag;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

use crate::common::error::{parse_error, Result};

/// Prefix shared by every RSA signature algorithm OID (PKCS #1).
pub const RSA_SIGNATURE_OID_PREFIX: &str = "1.2.840.113549.1.1";

/// The fields of an X.509 certificate the gateway fingerprint needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    /// Issuer attributes as `(short_name, value)`, in certificate order.
    pub issuer: Vec<(String, String)>,
    /// Serial number, lowercase hex of the DER integer bytes.
    pub serial_hex: String,
    /// Signature algorithm OID, dotted form.
    pub signature_oid: String,
    /// SubjectPublicKeyInfo DER.
    pub public_key_der: Vec<u8>,
}

impl CertificateRecord {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| parse_error(format!("X.509 parse error: {}", e)))?;

        let mut issuer = Vec::new();
        for rdn in cert.issuer().iter() {
            for attr in rdn.iter() {
                let oid = attr.attr_type().to_id_string();
                issuer.push((short_name(&oid).into_owned(), attribute_value(attr)));
            }
        }

        Ok(Self {
            issuer,
            serial_hex: hex::encode(cert.raw_serial()),
            signature_oid: cert.signature_algorithm.algorithm.to_id_string(),
            public_key_der: cert.public_key().raw.to_vec(),
        })
    }

    /// Parse the first certificate in a PEM document.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        Self::all_from_pem(pem)?
            .into_iter()
            .next()
            .ok_or_else(|| parse_error("no certificate in PEM data"))
    }

    /// Parse every `CERTIFICATE` block of a PEM bundle, in order.
    ///
    /// Other block types are skipped. Input with no PEM block at all, or any
    /// block that fails to decode, is a parse error.
    pub fn all_from_pem(pem: &[u8]) -> Result<Vec<Self>> {
        let mut records = Vec::new();
        let mut remaining = pem;
        let mut blocks = 0usize;

        while has_pem_header(remaining) {
            let (rest, block) = parse_x509_pem(remaining)
                .map_err(|e| parse_error(format!("invalid PEM block {}: {}", blocks + 1, e)))?;
            blocks += 1;
            if block.label == "CERTIFICATE" {
                records.push(Self::from_der(&block.contents)?);
            }
            remaining = rest;
        }

        if blocks == 0 {
            return Err(parse_error("no PEM block found"));
        }
        Ok(records)
    }

    /// `CN=...,OU=...,O=...,C=...`: issuer attributes in reverse order.
    pub fn principal_name(&self) -> String {
        self.issuer
            .iter()
            .rev()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Serial number in base 10. Serials routinely exceed 64 bits.
    pub fn decimal_serial(&self) -> Result<String> {
        BigUint::parse_bytes(self.serial_hex.as_bytes(), 16)
            .map(|n| n.to_str_radix(10))
            .ok_or_else(|| parse_error(format!("invalid serial number: {}", self.serial_hex)))
    }

    /// Gateway serial fingerprint: lowercase hex MD5 of principal name
    /// followed by the decimal serial.
    pub fn fingerprint(&self) -> Result<String> {
        let input = format!("{}{}", self.principal_name(), self.decimal_serial()?);
        Ok(format!("{:x}", md5::compute(input.as_bytes())))
    }

    pub fn is_rsa_signed(&self) -> bool {
        self.signature_oid.starts_with(RSA_SIGNATURE_OID_PREFIX)
    }
}

/// A line starting with `-----BEGIN ` remains, as the PEM reader expects it.
fn has_pem_header(input: &[u8]) -> bool {
    input
        .split(|&b| b == b'\n')
        .any(|line| line.starts_with(b"-----BEGIN "))
}

/// Issuer attribute value as text. String types the parser does not decode
/// itself fall back to UTF-16 (BMPString) or lossy UTF-8.
fn attribute_value(attr: &AttributeTypeAndValue<'_>) -> String {
    if let Ok(value) = attr.as_str() {
        return value.to_string();
    }
    let raw = attr.as_slice();
    if attr.attr_value().tag() == Tag::BmpString {
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8_lossy(raw).into_owned()
}

fn short_name(oid: &str) -> Cow<'static, str> {
    let name = match oid {
        "2.5.4.3" => "CN",
        "2.5.4.5" => "SERIALNUMBER",
        "2.5.4.6" => "C",
        "2.5.4.7" => "L",
        "2.5.4.8" => "ST",
        "2.5.4.9" => "STREET",
        "2.5.4.10" => "O",
        "2.5.4.11" => "OU",
        "1.2.840.113549.1.9.1" => "E",
        "0.9.2342.19200300.100.1.1" => "UID",
        "0.9.2342.19200300.100.1.25" => "DC",
        other => return Cow::Owned(other.to_string()),
    };
    Cow::Borrowed(name)
}
