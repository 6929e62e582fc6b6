//! Target-field name patterns used by the column matcher.
//!
//! Each target field owns an ordered list of case-insensitive regular
//! expressions matched against source column names. The order matters: the matcher
//! stops at the first pattern that matches. Lists mix English names with
//! Indonesian synonyms (`tanggal`, `jumlah`, `kategori`, ...).

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

const BUILTIN_PATTERNS: &[(&str, &[&str])] = &[
    (
        "date",
        &[
            r"^(transaction[ _-]?)?date$",
            r"^(tanggal|tgl)([ _]transaksi)?$",
            r"date",
            r"tanggal",
            r"waktu",
        ],
    ),
    (
        "amount",
        &[
            r"^(total[ _-]?)?amount$",
            r"^(total[ _-]?)?nominal$",
            r"^(jumlah|total)$",
            r"^(debit|credit|kredit)$",
            r"amount",
            r"nominal",
            r"total",
        ],
    ),
    (
        "category",
        &[
            r"^category$",
            r"^kategori$",
            r"^(transaction[ _-]?)?type$",
            r"^jenis$",
            r"category",
            r"kategori",
        ],
    ),
    (
        "description",
        &[
            r"^desc(ription)?$",
            r"^(deskripsi|keterangan|uraian)$",
            r"description",
            r"deskripsi",
            r"keterangan",
        ],
    ),
    (
        "reference",
        &[
            r"^ref(erence)?([ _-]?(no|number|id))?$",
            r"^referensi$",
            r"^no[ _.]?(ref|bukti|transaksi)$",
            r"^(transaction|invoice)[ _-]?(id|no|number)$",
            r"reference",
            r"referensi",
            r"invoice",
        ],
    ),
    (
        "notes",
        &[
            r"^notes?$",
            r"^catatan$",
            r"^remarks?$",
            r"^memo$",
            r"note",
            r"catatan",
            r"remark",
        ],
    ),
    (
        "name",
        &[
            r"^(full[ _-]?)?name$",
            r"^nama( lengkap)?$",
            r"^(employee|student|member)[ _-]?name$",
            r"^(nama[ _])?(karyawan|pegawai)$",
        ],
    ),
    (
        "status",
        &[
            r"^status$",
            r"^(kehadiran|attendance)$",
            r"^keterangan[ _]hadir$",
            r"status",
            r"kehadiran",
        ],
    ),
    (
        "check_in",
        &[
            r"^check[ _-]?in$",
            r"^(jam[ _])?masuk$",
            r"check[ _-]?in",
            r"clock[ _-]?in",
            r"time[ _-]?in",
        ],
    ),
    (
        "check_out",
        &[
            r"^check[ _-]?out$",
            r"^(jam[ _])?(keluar|pulang)$",
            r"check[ _-]?out",
            r"clock[ _-]?out",
            r"time[ _-]?out",
        ],
    ),
    (
        "department",
        &[
            r"^(department|dept)$",
            r"^(departemen|divisi|division|bagian)$",
            r"department",
            r"divisi",
        ],
    ),
    (
        "item_name",
        &[
            r"^item[ _-]?name$",
            r"^(nama[ _])?barang$",
            r"^product([ _-]?name)?$",
            r"^produk$",
            r"item",
            r"barang",
            r"product",
        ],
    ),
    (
        "quantity",
        &[
            r"^(quantity|qty)$",
            r"^kuantitas$",
            r"^jumlah[ _](barang|stok)$",
            r"^(stock|stok)$",
            r"quantity",
            r"qty",
            r"stok",
        ],
    ),
    (
        "unit_price",
        &[
            r"^unit[ _-]?price$",
            r"^harga([ _]satuan)?$",
            r"^(price|rate)$",
            r"price",
            r"harga",
        ],
    ),
    (
        "sku",
        &[
            r"^sku$",
            r"^(item|product)[ _-]?(code|id)$",
            r"^kode([ _]barang)?$",
            r"sku",
            r"kode",
        ],
    ),
    (
        "location",
        &[
            r"^location$",
            r"^(lokasi|gudang|warehouse|rak)$",
            r"location",
            r"lokasi",
            r"warehouse",
            r"gudang",
        ],
    ),
];

/// Serialized form of one field's pattern list, as found in a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternSpec {
    pub field: String,
    pub regex: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FieldPatterns {
    pub field: String,
    pub patterns: Vec<Regex>,
}

/// Compiled, immutable pattern families in field declaration order.
#[derive(Debug, Clone)]
pub struct PatternTable {
    fields: Vec<FieldPatterns>,
}

impl PatternTable {
    pub fn builtin() -> Self {
        let specs = BUILTIN_PATTERNS
            .iter()
            .map(|(field, patterns)| PatternSpec {
                field: (*field).to_string(),
                regex: patterns.iter().map(|p| (*p).to_string()).collect(),
            })
            .collect::<Vec<_>>();
        Self::from_specs(&specs).unwrap_or_else(|err| panic!("built-in patterns: {err}"))
    }

    pub fn from_specs(specs: &[PatternSpec]) -> Result<Self, ReportError> {
        let mut fields: Vec<FieldPatterns> = Vec::with_capacity(specs.len());
        for spec in specs {
            let field = spec.field.trim().to_string();
            let mut patterns = Vec::with_capacity(spec.regex.len());
            for source in &spec.regex {
                let compiled = RegexBuilder::new(source)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source_err| ReportError::InvalidPattern {
                        field: field.clone(),
                        pattern: source.clone(),
                        source: source_err,
                    })?;
                patterns.push(compiled);
            }
            if let Some(existing) = fields.iter_mut().find(|entry| entry.field == field) {
                existing.patterns.extend(patterns);
            } else {
                fields.push(FieldPatterns { field, patterns });
            }
        }
        Ok(Self { fields })
    }

    pub fn to_specs(&self) -> Vec<PatternSpec> {
        self.fields
            .iter()
            .map(|entry| PatternSpec {
                field: entry.field.clone(),
                regex: entry
                    .patterns
                    .iter()
                    .map(|p| p.as_str().to_string())
                    .collect(),
            })
            .collect()
    }

    pub fn patterns_for(&self, field: &str) -> Option<&[Regex]> {
        self.fields
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.patterns.as_slice())
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.patterns_for(field).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|entry| entry.field.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldPatterns> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::builtin()
    }
}
