/*!

This is the long-form manual for `vote_join` and `votejoin`.

## Matching identifiers

Identifiers are compared after [normalization](crate::normalize):
* accents are removed and letters are upper-cased: `Cañaveral` and `CANAVERAL` match
* punctuation becomes a space and spaces are collapsed: `Comuna 1, Norte` and `COMUNA 1 NORTE` match
* purely numeric identifiers lose their leading zeros: `007` and `7` match, `000` becomes `0`

The identifier of a record is read from the first non-empty field among a list of
candidates (by default `ID`, `Id`, `id`). A record without any usable identifier
is an error. An area without a vote row is not: it is kept in the output with no
metrics.

When two vote rows share the same identifier, the last one is used.

## Metrics

For each area with a vote row:
* `total` is the sum of the candidate votes and of the auxiliary counts (blank, null
  or void ballots), unless a total column is configured and holds a positive value that
  is at least the sum of the candidate votes.
* `winner` and `runnerUp` are the two candidates with the most votes. Counts are
  rounded to whole votes, but two candidates with the same rounded count are ranked on
  their exact values (`45.4` beats `45.2`). In case of an exact tie, the candidate listed
  first wins.
* `margin` is the difference of votes between the winner and the runner-up.
* `marginShare` and `winnerShare` are fractions of the total (zero when the total is zero).

Vote counts that are not numbers (`N/A`, empty cells, ...) count as zero. Counts too
large for 64 bits are capped, and so are the sums.

## Input formats

The areas:
* `geojson` a GeoJSON `FeatureCollection`. The identifier is looked up in the
  properties of each feature. The geometry is passed through untouched.
* `csv` point records (polling stations), one per row. The coordinates are read from
  the first column named `lat`, `latitude`, `LAT`, `Latitud` or `latitud` and the first
  column named `lon`, `lng`, `long`, `longitude`, `LON`, `Longitud` or `longitud`.

The vote rows:
* `csv` a table with a header row
* `xlsx` an Excel workbook. The first worksheet is used unless `excelWorksheetName` is set.

## Configuration file

```json
{
  "outputSettings": {
    "contestName": "Alcaldía de Cali 2023",
    "contestDate": "2023-10-29",
    "jurisdiction": "Santiago de Cali",
    "outputPath": "joined.json"
  },
  "areaSource": { "provider": "geojson", "filePath": "comunas.geojson", "idFields": ["id"] },
  "voteSources": [
    { "provider": "csv", "filePath": "votos_comunas.csv", "idFields": ["Nombre Comuna"] }
  ],
  "candidates": [
    { "name": "Eder", "field": "ALVARO ALEJANDRO EDER GARCES" },
    { "name": "Ortiz", "field": "ROBERTO ORTIZ URUEÑA" }
  ],
  "auxiliaryFields": ["VOTOS EN BLANCO", "VOTOS NULOS"],
  "totalField": "TOTAL_VOTOS",
  "aliases": { "AREA EXPANSION": "AREA DE EXPANSION" },
  "excludedIds": ["NACIONAL"]
}
```

Instead of listing the candidates, `candidatePrefix` selects all the columns starting
with a prefix (for example `%_`), in alphabetical order. The columns listed in
`trailingCandidates` are moved to the end.

Percentage tables often leave out the minor candidates. With
`"remainder": { "field": "%_otros" }`, the rows without a `%_otros` column get one,
equal to `100` minus the other candidates and clamped to `[0, 100]`. The candidate is
added to the list when the header does not have it. `whole` replaces `100`, and `name`
sets the name reported for the candidate.

File paths are relative to the directory of the configuration file.

## Output

A GeoJSON `FeatureCollection`, with one feature per area in the input order. The
properties of each feature are the original properties, plus `joinKey`, `metrics` and
`votes` (`null` for the areas without a vote row). These three replace any original
property of the same name, with a warning. A `summary` member describes the contest and
the outcome of the join: unmatched areas, unused vote rows, duplicated identifiers.
*/
