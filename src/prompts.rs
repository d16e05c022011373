//! Fixed instruction templates handed to the reasoning collaborator.
//!
//! Template text is part of each stage's contract; stages substitute address
//! fields into these templates and must not alter the rule sets they carry.

use crate::domain::Address;

const ENRICH_INSTRUCTIONS: &str = r#"You are an AI assistant specializing in finding information about the address data.

Your task is to take a information from the web search about the address and return the description about it.

The input is a list of web search results:
<formatted_web_search_info>
    {formatted_web_search_info}
<formatted_web_search_info/>

The address to validate is:
<address>
    <city>{city}</city>
    <zip_code>{zip_code}</zip_code>
    <country>{country}</country>
    <province>{province}</province>
    <address_lines>{address_lines}</address_lines>
</address>

As output provide a description field with any additional context or comments about the address and its validation."#;

const MATCH_INSTRUCTIONS: &str = r#"You are provided with a list of addresses and the description about problems with address.
Check if the provided address matches any of the addresses in the list. Apply fuzzy matching and real-world knowledge to find the best match.
Add all matching addresses to the "matchedAddresses" field in the output.
If no addresses match, return an empty list in this field.

Given:
- A target address to find
- A description about problems with address (if none, the field is empty)
- A list of candidate addresses to match against

<address-to-find>
    <city>{city}</city>
    <zip_code>{zip_code}</zip_code>
    <country>{country}</country>
    <province>{province}</province>
    <address_lines>{address_lines}</address_lines>
</address-to-find>

<description>
    {description}
<description/>

<addresses-to-match-against>
    {addresses_to_match_against}
</addresses-to-match-against>

If the address to find is incomplete or has errors, use the description to help identify potential matches.
If can not find any matches, return corrected address and empty list of matched addresses.
Never invent identifiers: every entry in "matchedAddresses" must carry the id of a candidate from the list above.
The matching should be done based on the overall similarity of the address components, not just exact text matches."#;

const NORMALIZE_INSTRUCTIONS: &str = r#"Your task is checking and normalizing the address provided below.
The input address is:
<address>
    <city>{city}</city>
    <zip_code>{zip_code}</zip_code>
    <country>{country}</country>
    <province>{province}</province>
    <address_lines>{address_lines}</address_lines>
</address>

Follow these instructions carefully:

- Put the normalized address in the "normalizedAddress" field in the output.
- Check if country is a valid country ISO 2-letter code. If not, set the "error" field to "true".
- Check if the city name is correctly spelled and capitalized. Check that the city exists in the specified country or if you are not aware of a city of such name check if there is a well-known city with a similar name and correct it.
- If the city name is a translated version, use the name that is commonly used in the specified country. For example, for country "PL", replace "Warsaw" with "Warszawa".
- If the city name does not resemble any existing city in the specified country, leave it as is.
- Verify the zip code format is appropriate for the country. Normalize it if it differs from the desired format only due to missing hyphens or similar formatting issues but the type and number of characters is otherwise correct.
- Ensure the province or state name is correctly spelled and capitalized. Check that the province exists in the specified country.
- Standardize the address lines by removing any unnecessary punctuation and ensuring proper capitalization.
- For Polish addresses, normalize the street address to contain the abbreviated street type, for example normalize "Cicha 27" to "Ul. Cicha 27" and "Plac Litewski 2/3" to "Pl. Litewski 2/3".
- In the description field, include any additional context or comments about the address and its normalization.
- If the address does not match the pattern of addresses found in the specified country, set the "error" field to "true"."#;

/// Short user-turn requests paired with each instruction template.
pub const ENRICH_TASK: &str = "Summarize the web search findings for the provided address.";
pub const MATCH_TASK: &str = "Find the address based on provided details.";
pub const NORMALIZE_TASK: &str = "Validate and normalize the address based on provided details.";

fn substitute_address(template: &str, address: &Address) -> String {
    template
        .replace("{city}", &address.city)
        .replace("{zip_code}", &address.zip_code)
        .replace("{country}", &address.country)
        .replace("{province}", &address.province)
        .replace("{address_lines}", &address.joined_lines())
}

pub fn enrich_instructions(address: &Address, formatted_web_search_info: &str) -> String {
    substitute_address(ENRICH_INSTRUCTIONS, address)
        .replace("{formatted_web_search_info}", formatted_web_search_info)
}

pub fn match_instructions(address: &Address, description: &str, candidates: &str) -> String {
    substitute_address(MATCH_INSTRUCTIONS, address)
        .replace("{description}", description)
        .replace("{addresses_to_match_against}", candidates)
}

pub fn normalize_instructions(address: &Address) -> String {
    substitute_address(NORMALIZE_INSTRUCTIONS, address)
}
