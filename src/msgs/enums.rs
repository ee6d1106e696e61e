#![allow(non_camel_case_types)]
use msgs::codec;
use msgs::codec::{Codec, Reader};

enum_builder! {@U16
  EnumName: ProtocolVersion;
  EnumVal {
    SSLv2 => 0x0200,
    SSLv3 => 0x0300,
    TLSv1_0 => 0x0301,
    TLSv1_1 => 0x0302,
    TLSv1_2 => 0x0303,
    TLSv1_3 => 0x0304
  }
}

enum_builder! {@U8
  EnumName: HandshakeType;
  EnumVal {
    HelloRequest => 0x00,
    ClientHello => 0x01,
    ServerHello => 0x02,
    NewSessionTicket => 0x04,
    EndOfEarlyData => 0x05,
    HelloRetryRequest => 0x06,
    EncryptedExtensions => 0x08,
    Certificate => 0x0b,
    CertificateRequest => 0x0d,
    CertificateVerify => 0x0f,
    Finished => 0x14,
    KeyUpdate => 0x18,
    ChannelId => 0xcb,
    MessageHash => 0xfe
  }
}

enum_builder! {@U8
  EnumName: Compression;
  EnumVal {
    Null => 0x00,
    Deflate => 0x01,
    LSZ => 0x40
  }
}

enum_builder! {@U8
  EnumName: AlertLevel;
  EnumVal {
    Warning => 0x01,
    Fatal => 0x02
  }
}

enum_builder! {@U8
  EnumName: AlertDescription;
  EnumVal {
    CloseNotify => 0x00,
    EndOfEarlyData => 0x01,
    UnexpectedMessage => 0x0a,
    BadRecordMac => 0x14,
    DecryptionFailed => 0x15,
    RecordOverflow => 0x16,
    DecompressionFailure => 0x1e,
    HandshakeFailure => 0x28,
    NoCertificate => 0x29,
    BadCertificate => 0x2a,
    UnsupportedCertificate => 0x2b,
    CertificateRevoked => 0x2c,
    CertificateExpired => 0x2d,
    CertificateUnknown => 0x2e,
    IllegalParameter => 0x2f,
    UnknownCA => 0x30,
    AccessDenied => 0x31,
    DecodeError => 0x32,
    DecryptError => 0x33,
    ExportRestriction => 0x3c,
    ProtocolVersion => 0x46,
    InsufficientSecurity => 0x47,
    InternalError => 0x50,
    InappropriateFallback => 0x56,
    UserCanceled => 0x5a,
    NoRenegotiation => 0x64,
    MissingExtension => 0x6d,
    UnsupportedExtension => 0x6e,
    CertificateUnobtainable => 0x6f,
    UnrecognisedName => 0x70,
    BadCertificateStatusResponse => 0x71,
    BadCertificateHashValue => 0x72,
    UnknownPSKIdentity => 0x73,
    CertificateRequired => 0x74
  }
}

enum_builder! {@U16
  EnumName: ExtensionType;
  EnumVal {
    ServerName => 0x0000,
    MaxFragmentLength => 0x0001,
    StatusRequest => 0x0005,
    EllipticCurves => 0x000a,
    ECPointFormats => 0x000b,
    SignatureAlgorithms => 0x000d,
    Heartbeat => 0x000f,
    ALProtocolNegotiation => 0x0010,
    SCT => 0x0012,
    Padding => 0x0015,
    ExtendedMasterSecret => 0x0017,
    SessionTicket => 0x0023,
    KeyShare => 0x0028,
    PreSharedKey => 0x0029,
    EarlyData => 0x002a,
    SupportedVersions => 0x002b,
    Cookie => 0x002c,
    PSKKeyExchangeModes => 0x002d,
    TicketEarlyDataInfo => 0x002e,
    CertificateAuthorities => 0x002f,
    ChannelId => 0x7550,
    RenegotiationInfo => 0xff01
  }
}

enum_builder! {@U16
  EnumName: CipherSuite;
  EnumVal {
    TLS13_AES_128_GCM_SHA256 => 0x1301,
    TLS13_AES_256_GCM_SHA384 => 0x1302,
    TLS13_CHACHA20_POLY1305_SHA256 => 0x1303
  }
}

enum_builder! {@U8
  EnumName: HashAlgorithm;
  EnumVal {
    NONE => 0x00,
    MD5 => 0x01,
    SHA1 => 0x02,
    SHA224 => 0x03,
    SHA256 => 0x04,
    SHA384 => 0x05,
    SHA512 => 0x06
  }
}

enum_builder! {@U16
  EnumName: SignatureScheme;
  EnumVal {
    RSA_PKCS1_SHA1 => 0x0201,
    RSA_PKCS1_SHA256 => 0x0401,
    RSA_PKCS1_SHA384 => 0x0501,
    RSA_PKCS1_SHA512 => 0x0601,
    ECDSA_NISTP256_SHA256 => 0x0403,
    ECDSA_NISTP384_SHA384 => 0x0503,
    ECDSA_NISTP521_SHA512 => 0x0603,
    RSA_PSS_SHA256 => 0x0804,
    RSA_PSS_SHA384 => 0x0805,
    RSA_PSS_SHA512 => 0x0806,
    ED25519 => 0x0807,
    ED448 => 0x0808
  }
}

enum_builder! {@U16
  EnumName: NamedGroup;
  EnumVal {
    secp256r1 => 0x0017,
    secp384r1 => 0x0018,
    secp521r1 => 0x0019,
    X25519 => 0x001d,
    X448 => 0x001e
  }
}
