//! Darwin Core vocabulary helpers shared by every policy.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// Join token for multi-valued fields.
pub const SEP: &str = " | ";

/// Default namespace for canonical field identifiers.
pub const NS: &str = "dwc";

/// Key holding nested extractor metadata (labeled flags).
pub const DYNAMIC_PROPERTIES: &str = "dwc:dynamicProperties";

/// Keys shorter than this keep their case in [`clean_key`].
const MIN_LEN: usize = 2;

/// Darwin Core terms, namespaced. Keys outside this list are terminology errors.
pub const CORE_TERMS: &[&str] = &[
    // Record-level
    "dwc:type", "dwc:modified", "dwc:language", "dwc:license", "dwc:rightsHolder",
    "dwc:accessRights", "dwc:bibliographicCitation", "dwc:references",
    "dwc:institutionID", "dwc:collectionID", "dwc:datasetID", "dwc:institutionCode",
    "dwc:collectionCode", "dwc:datasetName", "dwc:ownerInstitutionCode",
    "dwc:basisOfRecord", "dwc:informationWithheld", "dwc:dataGeneralizations",
    "dwc:dynamicProperties",
    // Occurrence
    "dwc:occurrenceID", "dwc:catalogNumber", "dwc:recordNumber", "dwc:recordedBy",
    "dwc:recordedByID", "dwc:individualCount", "dwc:organismQuantity",
    "dwc:organismQuantityType", "dwc:sex", "dwc:lifeStage", "dwc:reproductiveCondition",
    "dwc:behavior", "dwc:establishmentMeans", "dwc:degreeOfEstablishment",
    "dwc:pathway", "dwc:georeferenceVerificationStatus", "dwc:occurrenceStatus",
    "dwc:preparations", "dwc:disposition", "dwc:associatedMedia",
    "dwc:associatedOccurrences", "dwc:associatedReferences", "dwc:associatedSequences",
    "dwc:associatedTaxa", "dwc:otherCatalogNumbers", "dwc:occurrenceRemarks",
    "dwc:accessionNumber",
    // Organism
    "dwc:organismID", "dwc:organismName", "dwc:organismScope", "dwc:associatedOrganisms",
    "dwc:previousIdentifications", "dwc:organismRemarks",
    // Material sample
    "dwc:materialSampleID",
    // Event
    "dwc:eventID", "dwc:parentEventID", "dwc:fieldNumber", "dwc:eventDate",
    "dwc:eventTime", "dwc:startDayOfYear", "dwc:endDayOfYear", "dwc:year",
    "dwc:month", "dwc:day", "dwc:verbatimEventDate", "dwc:habitat",
    "dwc:samplingProtocol", "dwc:sampleSizeValue", "dwc:sampleSizeUnit",
    "dwc:samplingEffort", "dwc:fieldNotes", "dwc:eventRemarks",
    // Location
    "dwc:locationID", "dwc:higherGeographyID", "dwc:higherGeography", "dwc:continent",
    "dwc:waterBody", "dwc:islandGroup", "dwc:island", "dwc:country", "dwc:countryCode",
    "dwc:stateProvince", "dwc:county", "dwc:municipality", "dwc:locality",
    "dwc:verbatimLocality", "dwc:minimumElevationInMeters",
    "dwc:maximumElevationInMeters", "dwc:verbatimElevation",
    "dwc:verticalDatum", "dwc:minimumDepthInMeters", "dwc:maximumDepthInMeters",
    "dwc:verbatimDepth", "dwc:minimumDistanceAboveSurfaceInMeters",
    "dwc:maximumDistanceAboveSurfaceInMeters", "dwc:locationAccordingTo",
    "dwc:locationRemarks", "dwc:decimalLatitude", "dwc:decimalLongitude",
    "dwc:geodeticDatum", "dwc:coordinateUncertaintyInMeters",
    "dwc:coordinatePrecision", "dwc:pointRadiusSpatialFit",
    "dwc:verbatimCoordinates", "dwc:verbatimLatitude", "dwc:verbatimLongitude",
    "dwc:verbatimCoordinateSystem", "dwc:verbatimSRS", "dwc:footprintWKT",
    "dwc:footprintSRS", "dwc:footprintSpatialFit", "dwc:georeferencedBy",
    "dwc:georeferencedDate", "dwc:georeferenceProtocol", "dwc:georeferenceSources",
    "dwc:georeferenceRemarks",
    // Geological context
    "dwc:geologicalContextID", "dwc:earliestEonOrLowestEonothem",
    "dwc:formation", "dwc:member", "dwc:bed", "dwc:group",
    // Identification
    "dwc:identificationID", "dwc:verbatimIdentification", "dwc:identificationQualifier",
    "dwc:typeStatus", "dwc:identifiedBy", "dwc:identifiedByID", "dwc:dateIdentified",
    "dwc:identificationReferences", "dwc:identificationVerificationStatus",
    "dwc:identificationRemarks",
    // Taxon
    "dwc:taxonID", "dwc:scientificNameID", "dwc:acceptedNameUsageID",
    "dwc:parentNameUsageID", "dwc:originalNameUsageID", "dwc:nameAccordingToID",
    "dwc:namePublishedInID", "dwc:taxonConceptID", "dwc:scientificName",
    "dwc:acceptedNameUsage", "dwc:parentNameUsage", "dwc:originalNameUsage",
    "dwc:nameAccordingTo", "dwc:namePublishedIn", "dwc:namePublishedInYear",
    "dwc:higherClassification", "dwc:kingdom", "dwc:phylum", "dwc:class", "dwc:order",
    "dwc:superfamily", "dwc:family", "dwc:subfamily", "dwc:tribe", "dwc:subtribe",
    "dwc:genus", "dwc:genericName", "dwc:subgenus", "dwc:infragenericEpithet",
    "dwc:specificEpithet", "dwc:infraspecificEpithet", "dwc:cultivarEpithet",
    "dwc:taxonRank", "dwc:verbatimTaxonRank", "dwc:scientificNameAuthorship",
    "dwc:vernacularName", "dwc:nomenclaturalCode", "dwc:taxonomicStatus",
    "dwc:nomenclaturalStatus", "dwc:taxonRemarks",
];

/// Whether `key` is a Darwin Core term (exact, namespaced).
pub fn is_core_term(key: &str) -> bool {
    static TERMS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    TERMS
        .get_or_init(|| CORE_TERMS.iter().copied().collect())
        .contains(key)
}

/// Put a bare term into the default namespace; namespaced terms pass through.
pub fn ns(name: &str) -> String {
    if name.contains(':') {
        name.to_string()
    } else {
        format!("{NS}:{name}")
    }
}

/// The term without its namespace prefix.
pub fn local_name(label: &str) -> &str {
    label.split_once(':').map_or(label, |(_, local)| local)
}

/// Normalize an arbitrary extractor key into a namespaced term.
///
/// Known namespace prefixes (`dwc`, `dc`, `dcterms`, `dnz`, with `:` or `-`)
/// are dropped, the first letter is lower-cased for keys longer than two
/// characters, and the result is put back into the `dwc` namespace.
pub fn clean_key(key: &str) -> String {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let prefix = PREFIX
        .get_or_init(|| Regex::new(r"(?i)^(dcterms|dnz|dwc|dc)[:\-]").expect("valid regex"));

    let stripped = prefix.replace(key.trim(), "");
    let trimmed = stripped.trim().trim_matches(':').trim();

    let mut chars = trimmed.chars();
    let key = match chars.next() {
        Some(first) if trimmed.chars().count() > MIN_LEN => {
            first.to_lowercase().chain(chars).collect::<String>()
        }
        _ => trimmed.to_string(),
    };

    ns(&key)
}

/// Number of values folded into `value` with [`SEP`].
pub fn field_len(value: &str) -> usize {
    if value.trim().is_empty() {
        0
    } else {
        value.split(SEP).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_key_strips_known_prefixes() {
        assert_eq!(clean_key("dwc:Country"), "dwc:country");
        assert_eq!(clean_key("DWC-stateProvince"), "dwc:stateProvince");
        assert_eq!(clean_key("dcterms:modified"), "dwc:modified");
        assert_eq!(clean_key("RecordedBy"), "dwc:recordedBy");
    }

    #[test]
    fn clean_key_keeps_short_keys() {
        assert_eq!(clean_key("ID"), "dwc:ID");
        assert_eq!(clean_key(" sex: "), "dwc:sex");
    }

    #[test]
    fn clean_key_keeps_foreign_namespaces() {
        assert_eq!(clean_key("gbif:Verbatim"), "gbif:Verbatim");
    }

    #[test]
    fn field_len_counts_joined_values() {
        assert_eq!(field_len(""), 0);
        assert_eq!(field_len("A123"), 1);
        assert_eq!(field_len("A123 | B456"), 2);
    }

    #[test]
    fn core_terms_lookup() {
        assert!(is_core_term("dwc:eventDate"));
        assert!(!is_core_term("dwc:collectionDate"));
        assert_eq!(local_name("dwc:recordedByID"), "recordedByID");
        assert_eq!(local_name("habitat"), "habitat");
    }
}
